//! View model shared by the browser page and the preview binary.

use crate::config::AppConfig;
use crate::dataset::Dataset;
use crate::map::{MapError, MapRender, MapStyle, render_map};
use crate::mask::{ImageLoadError, encode_png, mask_photo};
use crate::session::{SessionPhase, SessionState};

pub const NOT_FOUND_MESSAGE: &str = "画像が見つかりません";

/// Text shown beside the photo for the current city.
#[derive(Debug, Clone, PartialEq)]
pub struct CityCard {
    pub number: u32,
    pub name: String,
    pub specialties: Vec<String>,
    pub info: String,
    pub population: u64,
    pub area: f64,
    /// Population and area on one line.
    pub figures: String,
}

/// What goes in the photo slot.
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoView {
    /// PNG of the photo with its name plate covered.
    Masked(Vec<u8>),
    /// The photo file as stored, shown after reveal.
    Full { bytes: Vec<u8>, mime: &'static str },
    /// No photo exists for this city.
    NotFound { path: String },
}

impl PhotoView {
    pub fn data_url(&self) -> Option<String> {
        use base64::Engine as _;
        use base64::engine::general_purpose::STANDARD;

        match self {
            Self::Masked(png) => Some(format!("data:image/png;base64,{}", STANDARD.encode(png))),
            Self::Full { bytes, mime } => {
                Some(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
            }
            Self::NotFound { .. } => None,
        }
    }
}

/// How the reply to a photo request is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoStatus {
    /// Read the body.
    Found,
    /// No file for this city; show [`NOT_FOUND_MESSAGE`].
    Missing,
    /// The server answered but did not serve the file.
    Failed(u16),
}

impl PhotoStatus {
    pub fn from_http(status: u16) -> Self {
        match status {
            200..=299 => Self::Found,
            404 => Self::Missing,
            other => Self::Failed(other),
        }
    }
}

pub fn city_card(dataset: &Dataset, session: &SessionState) -> Option<CityCard> {
    let city = session.current_city(dataset.catalog())?;

    Some(CityCard {
        number: city.number,
        name: city.trimmed_name().to_string(),
        specialties: city.points.clone(),
        info: city.info.clone(),
        population: city.population,
        area: city.area,
        figures: city.population_line(),
    })
}

/// Chooses the photo slot content for the current pick.
///
/// `photo` is `None` when the file for the city does not exist. The masker
/// only runs while the session is masked.
///
/// # Errors
/// Returns [`ImageLoadError`] when a masked photo cannot be decoded or re-encoded.
pub fn photo_view(
    photo: Option<&[u8]>,
    number: u32,
    revealed: bool,
    config: &AppConfig,
) -> Result<PhotoView, ImageLoadError> {
    let Some(bytes) = photo else {
        return Ok(PhotoView::NotFound {
            path: config.photo_path(number),
        });
    };

    if revealed {
        return Ok(PhotoView::Full {
            bytes: bytes.to_vec(),
            mime: config.photo_mime(),
        });
    }

    let masked = mask_photo(bytes)?;
    Ok(PhotoView::Masked(encode_png(&masked)?))
}

/// Map for the current session, or `None` before the first pick.
pub fn session_map(
    dataset: &Dataset,
    session: &SessionState,
    style: &MapStyle,
) -> Result<Option<MapRender>, MapError> {
    let Some(current) = session.current_city(dataset.catalog()) else {
        return Ok(None);
    };

    let visited = session.visited_names(dataset.catalog());
    render_map(dataset.region(), Some(&current.name), &visited, style).map(Some)
}

/// Everything on the page except the photo, which may need a fetch first.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub phase: SessionPhase,
    pub card: Option<CityCard>,
    pub trail: String,
    pub can_reveal: bool,
    pub can_clear: bool,
}

pub fn screen(dataset: &Dataset, session: &SessionState) -> Screen {
    let phase = session.phase();

    Screen {
        phase,
        card: city_card(dataset, session),
        trail: session.trail(dataset.catalog()),
        can_reveal: phase == SessionPhase::Masked,
        can_clear: phase != SessionPhase::NoSelection && session.is_clear_confirmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{demo_dataset, demo_photo};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn photo_bytes(number: u32) -> Vec<u8> {
        encode_png(&demo_photo(number)).expect("demo photo should encode")
    }

    #[test]
    fn only_404_counts_as_a_missing_photo() {
        assert_eq!(PhotoStatus::from_http(200), PhotoStatus::Found);
        assert_eq!(PhotoStatus::from_http(404), PhotoStatus::Missing);
        assert_eq!(PhotoStatus::from_http(403), PhotoStatus::Failed(403));
        assert_eq!(PhotoStatus::from_http(500), PhotoStatus::Failed(500));
    }

    #[test]
    fn empty_session_has_no_card_or_map() {
        let dataset = demo_dataset();
        let session = SessionState::new();

        let view = screen(&dataset, &session);

        assert_eq!(view.phase, SessionPhase::NoSelection);
        assert!(view.card.is_none());
        assert!(view.trail.is_empty());
        assert!(!view.can_reveal);
        assert!(
            session_map(&dataset, &session, &MapStyle::default())
                .expect("no map needed")
                .is_none()
        );
    }

    #[test]
    fn card_uses_trimmed_name_and_figures() {
        let dataset = demo_dataset();
        let mut session = SessionState::new();
        let only_otaru = crate::CityCatalog::new(vec![
            dataset.city(4).expect("demo has 小樽市").clone(),
        ])
        .expect("single city");
        session
            .pick_next(&mut StdRng::seed_from_u64(0), &only_otaru)
            .expect("pool is not empty");

        let card = city_card(&dataset, &session).expect("city is selected");

        assert_eq!(card.name, "小樽市");
        assert_eq!(card.specialties, vec!["ガラス細工".to_string(), "寿司".to_string()]);
        assert_eq!(card.figures, "人口: 111299人 / 面積: 243.83 km²");
    }

    #[test]
    fn masked_photo_is_png_with_fill() {
        let config = AppConfig::default();
        let bytes = photo_bytes(1);
        let view = photo_view(Some(bytes.as_slice()), 1, false, &config).expect("photo decodes");

        let PhotoView::Masked(png) = &view else {
            panic!("expected masked view, got {view:?}");
        };
        let decoded = image::load_from_memory(png).expect("masked png decodes").to_rgba8();
        assert_eq!(*decoded.get_pixel(60, 130), crate::mask::MASK_FILL);
        assert!(view.data_url().expect("has url").starts_with("data:image/png;base64,"));
    }

    #[test]
    fn revealed_photo_is_passed_through() {
        let config = AppConfig::default();
        let bytes = photo_bytes(2);

        let view = photo_view(Some(bytes.as_slice()), 2, true, &config)
            .expect("no decoding needed");

        assert_eq!(
            view,
            PhotoView::Full {
                bytes,
                mime: "image/gif",
            }
        );
    }

    #[test]
    fn revealed_photo_skips_decoding() {
        let view = photo_view(Some(&b"opaque bytes"[..]), 2, true, &AppConfig::default())
            .expect("reveal never decodes");

        assert!(matches!(view, PhotoView::Full { .. }));
    }

    #[test]
    fn missing_photo_is_not_an_error() {
        let view = photo_view(None, 39, false, &AppConfig::default()).expect("missing is fine");

        assert_eq!(
            view,
            PhotoView::NotFound {
                path: "images/039.gif".to_string()
            }
        );
        assert!(view.data_url().is_none());
    }

    #[test]
    fn undecodable_masked_photo_errors() {
        let error = photo_view(Some(&b"garbage"[..]), 1, false, &AppConfig::default())
            .expect_err("garbage cannot be masked");

        assert!(matches!(error, ImageLoadError::Decode(_)));
    }

    #[test]
    fn clear_is_offered_only_when_confirmed() {
        let dataset = demo_dataset();
        let mut session = SessionState::new();
        session
            .pick_next(&mut StdRng::seed_from_u64(4), dataset.catalog())
            .expect("pool is not empty");

        assert!(!screen(&dataset, &session).can_clear);
        session.set_clear_confirmation(true);
        assert!(screen(&dataset, &session).can_clear);
    }
}
