use crate::data::Cat;
use crate::session::PendingSwipe;
use gloo_timers::callback::Timeout;
use std::ops::Deref;
use wasm_bindgen::JsCast;
use yew::prelude::*;

const EXIT_MS: u32 = 300;
const TAP_TOLERANCE: f64 = 6.0;

#[derive(Clone, PartialEq)]
struct DragState {
    pointer_id: i32,
    start_x: f64,
    current_x: f64,
}

#[derive(Properties, PartialEq)]
pub struct CatCardProps {
    pub cat: Cat,
    pub image_url: String,
    /// CSS transform placing the card in the stack.
    pub transform: String,
    pub z_index: i32,
    pub active: bool,
    pub trigger: Option<PendingSwipe>,
    pub swipe_threshold: f64,
    pub on_swiped: Callback<bool>,
    pub on_select: Callback<Cat>,
}

#[function_component(CatCard)]
pub fn cat_card(props: &CatCardProps) -> Html {
    let drag_state = use_state(|| None::<DragState>);
    let leaving = use_state(|| None::<bool>);

    // Button swipes arrive as a pending request aimed at this card.
    {
        let leaving = leaving.clone();
        let wanted = props
            .trigger
            .as_ref()
            .filter(|pending| props.active && pending.target_id == props.cat.id)
            .map(|pending| pending.liked);
        use_effect_with_deps(
            move |wanted: &Option<bool>| {
                if let Some(liked) = *wanted {
                    if leaving.is_none() {
                        leaving.set(Some(liked));
                    }
                }
                || ()
            },
            wanted,
        );
    }

    // Report the swipe once the exit animation had time to play.
    {
        let on_swiped = props.on_swiped.clone();
        use_effect_with_deps(
            move |leaving: &Option<bool>| {
                let timeout = leaving.map(|liked| {
                    Timeout::new(EXIT_MS, move || on_swiped.emit(liked))
                });
                move || drop(timeout)
            },
            *leaving,
        );
    }

    let threshold = props.swipe_threshold;
    let drag_delta = drag_state
        .deref()
        .as_ref()
        .map(|d| d.current_x - d.start_x)
        .unwrap_or(0.0);

    let style = match *leaving {
        Some(liked) => format!(
            "transform: translateX({}150vw) rotate({}30deg); transition: transform {}ms ease-in; z-index: {};",
            if liked { "" } else { "-" },
            if liked { "" } else { "-" },
            EXIT_MS,
            props.z_index
        ),
        None if drag_state.is_some() => format!(
            "transform: translateX({:.1}px) rotate({:.2}deg); transition: transform 0s; z-index: {};",
            drag_delta,
            drag_delta * 0.05,
            props.z_index
        ),
        None => format!(
            "transform: {}; transition: transform 0.25s ease; z-index: {};",
            props.transform, props.z_index
        ),
    };

    let pointer_down = {
        let drag_state = drag_state.clone();
        let active = props.active;
        let leaving = leaving.clone();
        Callback::from(move |event: web_sys::PointerEvent| {
            if !active || leaving.is_some() || drag_state.deref().is_some() {
                return;
            }
            event.prevent_default();
            if let Some(target) = event
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            {
                let _ = target.set_pointer_capture(event.pointer_id());
            }
            drag_state.set(Some(DragState {
                pointer_id: event.pointer_id(),
                start_x: event.client_x() as f64,
                current_x: event.client_x() as f64,
            }));
        })
    };

    let pointer_move = {
        let drag_state = drag_state.clone();
        Callback::from(move |event: web_sys::PointerEvent| {
            if let Some(mut state) = drag_state.deref().clone() {
                if state.pointer_id == event.pointer_id() {
                    event.prevent_default();
                    state.current_x = event.client_x() as f64;
                    drag_state.set(Some(state));
                }
            }
        })
    };

    let pointer_end = {
        let drag_state = drag_state.clone();
        let leaving = leaving.clone();
        let on_select = props.on_select.clone();
        let cat = props.cat.clone();
        Callback::from(move |event: web_sys::PointerEvent| {
            if let Some(state) = drag_state.deref().clone() {
                if state.pointer_id == event.pointer_id() {
                    release_pointer(&event);
                    let delta = state.current_x - state.start_x;
                    if delta.abs() > threshold {
                        leaving.set(Some(delta > 0.0));
                    } else if delta.abs() < TAP_TOLERANCE {
                        on_select.emit(cat.clone());
                    }
                    drag_state.set(None);
                }
            }
        })
    };

    let pointer_cancel = {
        let drag_state = drag_state.clone();
        Callback::from(move |event: web_sys::PointerEvent| {
            if let Some(state) = drag_state.deref().clone() {
                if state.pointer_id == event.pointer_id() {
                    release_pointer(&event);
                    drag_state.set(None);
                }
            }
        })
    };

    let hint = swipe_hint(drag_delta, threshold);

    html! {
        <div class={classes!("cat-card", props.active.then_some("active"))}
            style={style}
            onpointerdown={pointer_down}
            onpointermove={pointer_move}
            onpointerup={pointer_end}
            onpointercancel={pointer_cancel}>
            <img src={props.image_url.clone()} alt="A cat" draggable="false" />
            {
                match hint {
                    Some(true) => html! { <span class="swipe-hint like">{ "LIKE" }</span> },
                    Some(false) => html! { <span class="swipe-hint nope">{ "NOPE" }</span> },
                    None => html! {},
                }
            }
        </div>
    }
}

fn release_pointer(event: &web_sys::PointerEvent) {
    if let Some(target) = event
        .target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
    {
        let _ = target.release_pointer_capture(event.pointer_id());
    }
}

/// Which badge to show while dragging: `Some(true)` for like once the card
/// is more than half way to the threshold.
fn swipe_hint(delta: f64, threshold: f64) -> Option<bool> {
    let normalized = (delta / threshold).clamp(-1.0, 1.0);
    if normalized.abs() < 0.5 {
        None
    } else {
        Some(normalized > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_needs_half_the_threshold() {
        assert_eq!(swipe_hint(10.0, 80.0), None);
        assert_eq!(swipe_hint(45.0, 80.0), Some(true));
        assert_eq!(swipe_hint(-200.0, 80.0), Some(false));
    }
}
