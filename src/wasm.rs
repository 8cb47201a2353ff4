#![cfg(target_arch = "wasm32")]

use crate::present::NOT_FOUND_MESSAGE;
use crate::{
    AppConfig, Dataset, MapStyle, PhotoStatus, PhotoView, SessionState, photo_view, screen,
    session_map,
};
use gloo_net::http::Request;
use leptos::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::rc::Rc;

/// Optional overrides served next to the page.
const CONFIG_PATH: &str = "countrysign.json";

type Loaded = Result<(Rc<AppConfig>, Rc<Dataset>), String>;

async fn fetch_response(path: &str) -> Result<gloo_net::http::Response, String> {
    let response = Request::get(path)
        .send()
        .await
        .map_err(|error| error.to_string())?;

    if !response.ok() {
        return Err(format!("{}: HTTP {}", path, response.status()));
    }

    Ok(response)
}

async fn fetch_text(path: &str) -> Result<String, String> {
    fetch_response(path)
        .await?
        .text()
        .await
        .map_err(|error| error.to_string())
}

async fn fetch_config() -> AppConfig {
    let parsed = fetch_text(CONFIG_PATH)
        .await
        .and_then(|text| AppConfig::from_json_str(&text).map_err(|error| error.to_string()));

    match parsed {
        Ok(config) => config,
        Err(message) => {
            logging::log!("using default config ({message})");
            AppConfig::default()
        }
    }
}

async fn load_quiz() -> Loaded {
    let config = fetch_config().await;
    let table = fetch_text(&config.city_table).await?;
    let geometry = fetch_text(&config.region_geometry).await?;

    let dataset = Dataset::from_sources(table.as_bytes(), &geometry, &config)
        .map_err(|error| error.to_string())?;

    for number in dataset.unmatched_cities() {
        logging::warn!("city {number} has no matching boundary polygon");
    }

    Ok((Rc::new(config), Rc::new(dataset)))
}

/// `None` before the first pick.
async fn load_photo(
    config: Rc<AppConfig>,
    number: Option<u32>,
    revealed: bool,
) -> Option<Result<PhotoView, String>> {
    let number = number?;
    Some(fetch_photo(&config, number, revealed).await)
}

async fn fetch_photo(
    config: &AppConfig,
    number: u32,
    revealed: bool,
) -> Result<PhotoView, String> {
    let path = config.photo_path(number);
    let response = Request::get(&path)
        .send()
        .await
        .map_err(|error| format!("{path}: {error}"))?;

    let bytes = match PhotoStatus::from_http(response.status()) {
        PhotoStatus::Found => Some(
            response
                .binary()
                .await
                .map_err(|error| format!("{path}: {error}"))?,
        ),
        PhotoStatus::Missing => {
            logging::log!("photo not found: {path}");
            None
        }
        PhotoStatus::Failed(status) => return Err(format!("{path}: HTTP {status}")),
    };

    photo_view(bytes.as_deref(), number, revealed, config).map_err(|error| error.to_string())
}

fn map_data_url(
    dataset: &Dataset,
    session: &SessionState,
    style: &MapStyle,
) -> Option<Result<String, String>> {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    let render = match session_map(dataset, session, style) {
        Ok(render) => render?,
        Err(error) => return Some(Err(error.to_string())),
    };

    for name in &render.missing {
        logging::warn!("{} に一致する地物が見つかりませんでした", name.trim());
    }

    Some(
        render
            .encode_png()
            .map(|png| format!("data:image/png;base64,{}", STANDARD.encode(png)))
            .map_err(|error| error.to_string()),
    )
}

#[component]
fn PhotoPanel(
    photo: Option<Option<Result<PhotoView, String>>>,
    caption: Option<String>,
) -> impl IntoView {
    match photo {
        None => view! { <p class="lede">"読み込み中..."</p> }.into_view(),
        Some(None) => ().into_view(),
        Some(Some(Err(message))) => view! {
            <section class="error-card">
                <p class="error-body">{message}</p>
            </section>
        }
        .into_view(),
        Some(Some(Ok(PhotoView::NotFound { path }))) => view! {
            <p class="warning" title=path>{NOT_FOUND_MESSAGE}</p>
        }
        .into_view(),
        Some(Some(Ok(photo))) => {
            let caption = match &photo {
                PhotoView::Full { .. } => caption,
                _ => None,
            };
            view! {
                <figure class="sign-photo">
                    <img src=photo.data_url().unwrap_or_default() alt="カントリーサイン" />
                    {caption.map(|text| view! { <figcaption>{text}</figcaption> })}
                </figure>
            }
            .into_view()
        }
    }
}

#[component]
fn Quiz(config: Rc<AppConfig>, dataset: Rc<Dataset>) -> impl IntoView {
    let session = create_rw_signal(SessionState::new());
    let rng = store_value(StdRng::from_entropy());
    let (notice, set_notice) = create_signal::<Option<String>>(None);

    let pick_dataset = Rc::clone(&dataset);
    let next_city = move |_| {
        let mut outcome = Ok(0);
        rng.update_value(|rng| {
            session.update(|state| outcome = state.pick_next(rng, pick_dataset.catalog()));
        });
        set_notice.set(outcome.err().map(|error| error.to_string()));
    };

    let reveal = move |_| {
        session.update(|state| {
            if let Err(error) = state.reveal() {
                logging::warn!("{error}");
            }
        });
    };

    let toggle_confirmation = move |ev| {
        let checked = event_target_checked(&ev);
        session.update(|state| state.set_clear_confirmation(checked));
    };

    let clear = move |_| {
        let mut outcome = Ok(());
        session.update(|state| outcome = state.clear_history());
        set_notice.set(Some(match outcome {
            Ok(()) => "履歴を消去しました。".to_string(),
            Err(error) => error.to_string(),
        }));
    };

    let photo_config = Rc::clone(&config);
    let photo = create_local_resource(
        move || session.with(|state| (state.current_number(), state.is_revealed())),
        move |(number, revealed)| load_photo(Rc::clone(&photo_config), number, revealed),
    );

    let screen_dataset = store_value(Rc::clone(&dataset));
    let current_screen =
        move || screen_dataset.with_value(|dataset| session.with(|state| screen(dataset, state)));

    // The map only depends on the picks, not on reveal or the checkbox.
    let history = create_memo(move |_| session.with(|state| state.history().to_vec()));
    let map_dataset = Rc::clone(&dataset);
    let map_style = config.map.clone();
    let map_view = move || {
        history.track();
        match session.with_untracked(|state| map_data_url(&map_dataset, state, &map_style)) {
            None => ().into_view(),
            Some(Ok(url)) => view! { <img class="region-map" src=url alt="地図" /> }.into_view(),
            Some(Err(message)) => view! {
                <section class="error-card">
                    <p class="error-body">{message}</p>
                </section>
            }
            .into_view(),
        }
    };

    let city_column = move || {
        let view_model = current_screen();
        let caption = view_model.card.as_ref().map(|card| card.name.clone());
        let reveal_button = view_model
            .can_reveal
            .then(|| view! { <button class="pill" on:click=reveal>"画像を全表示"</button> });

        view! {
            <PhotoPanel photo=photo.get() caption=caption />
            {reveal_button}
            {view_model.card.map(|card| {
                view! {
                    <div class="city-card">
                        <h5>"特産品"</h5>
                        <ul class="specialties">
                            {card
                                .specialties
                                .into_iter()
                                .map(|item| view! { <li>{item}</li> })
                                .collect_view()}
                        </ul>
                        <p><strong>"紹介: "</strong>{card.info}</p>
                        <p>{card.figures}</p>
                    </div>
                }
            })}
        }
    };

    let history_section = move || {
        let view_model = current_screen();
        if view_model.card.is_none() {
            return ().into_view();
        }

        let clear_button = view_model
            .can_clear
            .then(|| view! { <button class="danger" on:click=clear>"履歴を消去"</button> });

        view! {
            <section class="history">
                <hr />
                <h5>"📝 これまでに表示した都市の履歴"</h5>
                <p class="trail">{view_model.trail}</p>
                <hr />
                <h5>"⚠️ 履歴を削除しますか？"</h5>
                <label>
                    <input
                        type="checkbox"
                        prop:checked=move || session.with(SessionState::is_clear_confirmed)
                        on:change=toggle_confirmation
                    />
                    "削除"
                </label>
                {clear_button}
            </section>
        }
        .into_view()
    };

    view! {
        <header class="page-header">
            <h1 class="headline">{config.page_title.clone()}</h1>
            <button class="primary" on:click=next_city>"次の街へ"</button>
        </header>
        {move || notice.get().map(|message| view! { <p class="notice">{message}</p> })}
        <div class="grid-main">
            <div class="city-column">{city_column}</div>
            <div class="map-column">{map_view}</div>
        </div>
        {history_section}
    }
}

#[component]
fn App() -> impl IntoView {
    let loaded = create_local_resource(|| (), |_| load_quiz());

    view! {
        <main class="page">
            {move || match loaded.get() {
                None => view! {
                    <section class="placeholder-card">
                        <p class="lede">"データを読み込み中..."</p>
                    </section>
                }
                .into_view(),
                Some(Err(message)) => view! {
                    <section class="error-card">
                        <p class="eyebrow">"データの読み込みに失敗しました"</p>
                        <p class="error-body">{message}</p>
                    </section>
                }
                .into_view(),
                Some(Ok((config, dataset))) => {
                    view! { <Quiz config=config dataset=dataset /> }.into_view()
                }
            }}
        </main>
    }
}

pub fn mount() {
    console_error_panic_hook::set_once();
    mount_to_body(|| view! { <App /> });
}
