//! Browser-backed collaborators for [`SwipeDeck`](crate::deck::SwipeDeck).

use crate::data::DataError;
use crate::deck::{ImagePreloader, Scheduler, TimerHandle};
use gloo_timers::callback::Timeout;
use std::time::Duration;
use web_sys::HtmlImageElement;

/// `setTimeout` through gloo; dropping the returned handle clears the timeout.
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle {
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        TimerHandle::new(Timeout::new(millis, task))
    }
}

/// Warms the HTTP cache by pointing a detached `<img>` at the url.
pub struct BrowserPreloader;

impl ImagePreloader for BrowserPreloader {
    fn preload(&self, url: &str) -> Result<(), DataError> {
        let image =
            HtmlImageElement::new().map_err(|err| DataError::Preload(format!("{:?}", err)))?;
        image.set_src(url);
        Ok(())
    }
}
