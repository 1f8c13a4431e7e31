use crate::config::DeckConfig;
use crate::data::{Cat, CatSource, DataError};
use crate::session::{LoadOutcome, Phase, SessionToken, SwipeSession};
use crate::stack::CardTransform;
use log::{debug, info};
use std::cell::{Cell, Ref, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Keeps a scheduled task alive. Dropping the handle cancels the task.
pub struct TimerHandle {
    _guard: Box<dyn std::any::Any>,
}

impl TimerHandle {
    pub fn new<G: 'static>(guard: G) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }

    pub fn cancel(self) {}
}

pub trait Scheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle;
}

pub trait ImagePreloader {
    fn preload(&self, url: &str) -> Result<(), DataError>;
}

type Observer = Rc<dyn Fn()>;

#[derive(Default)]
struct Observers {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Observer)>>,
}

/// Registration returned by [`SwipeDeck::subscribe`]; unsubscribes on drop.
pub struct Subscription {
    id: u64,
    observers: Weak<Observers>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            observers
                .entries
                .borrow_mut()
                .retain(|(id, _)| *id != self.id);
        }
    }
}

struct DeckInner {
    config: DeckConfig,
    session: RefCell<SwipeSession>,
    source: Rc<dyn CatSource>,
    scheduler: Rc<dyn Scheduler>,
    preloader: Rc<dyn ImagePreloader>,
    summary_timer: RefCell<Option<TimerHandle>>,
    observers: Rc<Observers>,
}

/// The swipe screen's view-model: owns the session and talks to the
/// fetcher, the timer and the image cache on its behalf.
#[derive(Clone)]
pub struct SwipeDeck {
    inner: Rc<DeckInner>,
}

impl SwipeDeck {
    pub fn new(
        config: DeckConfig,
        source: Rc<dyn CatSource>,
        scheduler: Rc<dyn Scheduler>,
        preloader: Rc<dyn ImagePreloader>,
    ) -> Self {
        Self {
            inner: Rc::new(DeckInner {
                config,
                session: RefCell::new(SwipeSession::new()),
                source,
                scheduler,
                preloader,
                summary_timer: RefCell::new(None),
                observers: Rc::new(Observers::default()),
            }),
        }
    }

    pub fn config(&self) -> &DeckConfig {
        &self.inner.config
    }

    pub fn session(&self) -> Ref<'_, SwipeSession> {
        self.inner.session.borrow()
    }

    pub fn phase(&self) -> Phase {
        self.session().phase()
    }

    pub fn cursor(&self) -> usize {
        self.session().cursor()
    }

    pub fn subscribe(&self, observer: impl Fn() + 'static) -> Subscription {
        let observers = &self.inner.observers;
        let id = observers.next_id.get();
        observers.next_id.set(id + 1);
        observers
            .entries
            .borrow_mut()
            .push((id, Rc::new(observer)));
        Subscription {
            id,
            observers: Rc::downgrade(observers),
        }
    }

    /// Enters `Loading` right away and returns the fetch that completes the
    /// load. A completion that lands after a newer load is discarded.
    pub fn load_cats(&self) -> impl Future<Output = ()> + 'static {
        self.cancel_summary_timer();
        let token = self.inner.session.borrow_mut().begin_load();
        debug!("Loading cats for session {:?}", token);
        self.notify();

        let deck = self.clone();
        let count = self.inner.config.batch_size;
        async move {
            let source = Rc::clone(&deck.inner.source);
            let batch = source.fetch_batch(count).await;
            deck.complete_load(token, batch);
        }
    }

    pub fn reset(&self) -> impl Future<Output = ()> + 'static {
        self.inner.session.borrow_mut().deselect();
        self.load_cats()
    }

    pub fn on_swiped(&self, liked: bool) {
        let outcome = self.inner.session.borrow_mut().swipe(liked);
        let Some(outcome) = outcome else {
            return;
        };
        debug!(
            "Swiped {} at {}",
            if outcome.liked { "right" } else { "left" },
            outcome.cursor - 1
        );

        self.preload(outcome.cursor + self.inner.config.lookahead, 1);

        if outcome.exhausted {
            let token = self.session().token();
            self.schedule_summary(token);
        }
        self.notify();
    }

    pub fn swipe_action(&self, liked: bool) {
        if self.inner.session.borrow_mut().request_swipe(liked).is_some() {
            self.notify();
        }
    }

    /// Acknowledges a pending button swipe without swiping.
    pub fn clear_pending_swipe(&self) {
        if self.inner.session.borrow_mut().clear_pending_swipe().is_some() {
            self.notify();
        }
    }

    pub fn select_cat(&self, cat: &Cat) {
        if self.inner.session.borrow_mut().select(cat) {
            self.notify();
        }
    }

    pub fn deselect_cat(&self) {
        if self.inner.session.borrow_mut().deselect().is_some() {
            self.notify();
        }
    }

    pub fn card_transform(&self, index: i64) -> CardTransform {
        self.session().card_transform(index)
    }

    pub fn image_url(&self, cat: &Cat) -> String {
        self.inner.config.image_url(&cat.id)
    }

    fn complete_load(&self, token: SessionToken, batch: Vec<Cat>) {
        let outcome = self.inner.session.borrow_mut().complete_load(token, batch);
        match outcome {
            LoadOutcome::Stale => {
                debug!("Dropping stale load for session {:?}", token);
                return;
            }
            LoadOutcome::Empty => info!("No cats to show"),
            LoadOutcome::Ready(count) => {
                info!("Loaded {} cats", count);
                self.preload(0, self.inner.config.initial_preload);
            }
        }
        self.notify();
    }

    fn schedule_summary(&self, token: SessionToken) {
        let weak = Rc::downgrade(&self.inner);
        let handle = self.inner.scheduler.schedule(
            self.inner.config.summary_delay(),
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    SwipeDeck { inner }.finish_session(token);
                }
            }),
        );
        self.cancel_summary_timer();
        *self.inner.summary_timer.borrow_mut() = Some(handle);
    }

    fn finish_session(&self, token: SessionToken) {
        // A timer from an older session must leave the current handle alone.
        // The handle itself is dropped only after the task body ran.
        let finished_timer = if self.session().token() == token {
            self.inner.summary_timer.borrow_mut().take()
        } else {
            None
        };
        let changed = self.inner.session.borrow_mut().finish(token);
        if changed {
            info!("All cats swiped, showing summary");
            self.notify();
        }
        drop(finished_timer);
    }

    fn cancel_summary_timer(&self) {
        let timer = self.inner.summary_timer.borrow_mut().take();
        if let Some(timer) = timer {
            debug!("Cancelling pending summary");
            timer.cancel();
        }
    }

    fn preload(&self, start: usize, count: usize) {
        let urls: Vec<String> = {
            let session = self.session();
            session
                .items()
                .iter()
                .skip(start)
                .take(count)
                .map(|cat| self.image_url(cat))
                .collect()
        };
        for url in urls {
            if let Err(err) = self.inner.preloader.preload(&url) {
                debug!("Ignoring preload failure for {}: {}", url, err);
            }
        }
    }

    fn notify(&self) {
        let observers: Vec<Observer> = self
            .inner
            .observers
            .entries
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();
        for observer in observers {
            observer();
        }
    }
}
