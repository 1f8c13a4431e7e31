pub mod browser;
pub mod card;
pub mod config;
pub mod data;
pub mod deck;
pub mod session;
pub mod stack;

use browser::{BrowserPreloader, BrowserScheduler};
use card::CatCard;
use config::{load_config, DeckConfig};
use data::{Cat, CatFetcher, HttpCatPool};
use deck::SwipeDeck;
use log::info;
use session::{Phase, SwipeSession};
use std::rc::Rc;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

/// How many cards below the active one are actually rendered.
const VISIBLE_CARDS: usize = 4;

#[function_component(App)]
fn app() -> Html {
    let config = use_state(|| None::<DeckConfig>);

    {
        let config = config.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    let loaded = load_config().await;
                    log::set_max_level(loaded.log_filter());
                    config.set(Some(loaded));
                });
                || ()
            },
            (),
        );
    }

    match (*config).clone() {
        Some(config) => html! { <SwipeScreen {config} /> },
        None => html! { <div class="app-container"><p class="status">{ "Loading…" }</p></div> },
    }
}

#[derive(Properties, PartialEq)]
struct SwipeScreenProps {
    config: DeckConfig,
}

#[function_component(SwipeScreen)]
fn swipe_screen(props: &SwipeScreenProps) -> Html {
    let deck = use_memo(
        |config: &DeckConfig| {
            let source = CatFetcher::new(HttpCatPool::new(config.pool_url()));
            SwipeDeck::new(
                config.clone(),
                Rc::new(source),
                Rc::new(BrowserScheduler),
                Rc::new(BrowserPreloader),
            )
        },
        props.config.clone(),
    );
    let rerender = use_force_update();

    {
        let deck = (*deck).clone();
        use_effect_with_deps(
            move |_| {
                let subscription = deck.subscribe(move || rerender.force_update());
                info!("Starting first batch");
                spawn_local(deck.load_cats());
                move || drop(subscription)
            },
            (),
        );
    }

    let on_swiped = {
        let deck = (*deck).clone();
        Callback::from(move |liked: bool| deck.on_swiped(liked))
    };
    let on_select = {
        let deck = (*deck).clone();
        Callback::from(move |cat: Cat| deck.select_cat(&cat))
    };
    let on_deselect = {
        let deck = (*deck).clone();
        Callback::from(move |_: MouseEvent| deck.deselect_cat())
    };
    let on_like = {
        let deck = (*deck).clone();
        Callback::from(move |_: MouseEvent| deck.swipe_action(true))
    };
    let on_dislike = {
        let deck = (*deck).clone();
        Callback::from(move |_: MouseEvent| deck.swipe_action(false))
    };
    let on_reset = {
        let deck = (*deck).clone();
        Callback::from(move |_: MouseEvent| spawn_local(deck.reset()))
    };

    let session = deck.session();
    let content = match session.phase() {
        Phase::Loading => html! { <p class="status">{ "Fetching cats…" }</p> },
        Phase::Swiping => html! {
            <>
                { render_stack(&deck, &session, &on_swiped, &on_select) }
                <div class="actions">
                    <button class="action dislike" onclick={on_dislike}>{ "✕" }</button>
                    <span class="progress">
                        { format!("{} / {}", (session.cursor() + 1).min(session.items().len()), session.items().len()) }
                    </span>
                    <button class="action like" onclick={on_like}>{ "♥" }</button>
                </div>
            </>
        },
        Phase::Summary => render_summary(&deck, &session, &on_select, on_reset),
    };

    let detail = session
        .selected()
        .map(|cat| render_detail(&deck, cat, on_deselect))
        .unwrap_or_else(|| html! {});

    html! {
        <div class="app-container">
            <header><h1>{ "Paws & Preferences" }</h1></header>
            <main class="content">{ content }</main>
            { detail }
        </div>
    }
}

fn render_stack(
    deck: &SwipeDeck,
    session: &SwipeSession,
    on_swiped: &Callback<bool>,
    on_select: &Callback<Cat>,
) -> Html {
    let cursor = session.cursor();
    let token = session.token();
    let pending = session.pending_swipe().cloned();

    // Cards behind the cursor are already off screen; keep the one that is
    // still playing its exit animation.
    let first = cursor.saturating_sub(1);
    let cards = session
        .items()
        .iter()
        .enumerate()
        .skip(first)
        .take(VISIBLE_CARDS + 1)
        .map(|(index, cat)| {
            let transform = deck.card_transform(index as i64).to_string();
            let z_index = (session.items().len() - index) as i32;
            html! {
                <CatCard
                    key={format!("{:?}-{}", token, index)}
                    cat={cat.clone()}
                    image_url={deck.image_url(cat)}
                    {transform}
                    {z_index}
                    active={index == cursor}
                    trigger={pending.clone()}
                    swipe_threshold={deck.config().swipe_threshold}
                    on_swiped={on_swiped.clone()}
                    on_select={on_select.clone()} />
            }
        });

    html! {
        <div class="card-stack">
            { for cards }
        </div>
    }
}

fn render_summary(
    deck: &SwipeDeck,
    session: &SwipeSession,
    on_select: &Callback<Cat>,
    on_reset: Callback<MouseEvent>,
) -> Html {
    let liked = session.liked();
    let headline = if session.items().is_empty() {
        "No cats could be found right now.".to_string()
    } else {
        format!("You liked {} of {} cats", liked.len(), session.items().len())
    };

    let grid = if liked.is_empty() {
        html! {}
    } else {
        html! {
            <div class="liked-grid">
                { for liked.iter().enumerate().map(|(index, cat)| {
                    let on_click = {
                        let on_select = on_select.clone();
                        let cat = cat.clone();
                        Callback::from(move |_: MouseEvent| on_select.emit(cat.clone()))
                    };
                    html! {
                        <button key={format!("{}-{}", index, cat.id)} class="liked-thumb" onclick={on_click}>
                            <img src={deck.image_url(cat)} alt="A liked cat" loading="lazy" />
                        </button>
                    }
                }) }
            </div>
        }
    };

    html! {
        <section class="summary">
            <h2>{ headline }</h2>
            { grid }
            <button class="restart" onclick={on_reset}>{ "Start over" }</button>
        </section>
    }
}

fn render_detail(deck: &SwipeDeck, cat: &Cat, on_close: Callback<MouseEvent>) -> Html {
    let stop_click = Callback::from(|event: MouseEvent| event.stop_propagation());
    let tags = cat.tags();

    html! {
        <div class="detail-overlay" onclick={on_close.clone()}>
            <figure class="detail" onclick={stop_click}>
                <img src={deck.image_url(cat)} alt="Selected cat" />
                {
                    if tags.is_empty() {
                        html! {}
                    } else {
                        html! {
                            <figcaption>
                                { for tags.iter().map(|tag| html! { <span class="tag">{ *tag }</span> }) }
                            </figcaption>
                        }
                    }
                }
                <button class="detail-close" onclick={on_close}>{ "×" }</button>
            </figure>
        </div>
    }
}

#[wasm_bindgen(start)]
pub fn run_app() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Trace));
    log::set_max_level(log::LevelFilter::Info);
    yew::Renderer::<App>::new().render();
}
