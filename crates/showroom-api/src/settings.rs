//! Site-wide singletons: footer layout and the colour palette.

use axum::{
    Json,
    extract::State,
    http::header,
    response::IntoResponse,
};
use tracing::info;

use showroom_types::Record;
use showroom_types::api::{ColorRequest, FooterRequest};
use showroom_types::models::{
    ColorSettings, DEFAULT_FOOTER_BACKGROUND, DEFAULT_FOOTER_TEXT, FooterSettings, SocialMedia,
};

use crate::common::{envelope, optional_text, text};
use crate::error::ApiResult;
use crate::state::{AppState, with_db};

/// Build the stored footer from a POST body. Missing social links become
/// empty strings and missing colours fall back to the defaults.
pub fn footer_from_request(req: FooterRequest) -> FooterSettings {
    let social = req.social_media.unwrap_or_default();
    FooterSettings {
        columns: req.columns.unwrap_or_default(),
        social_media: SocialMedia {
            youtube: text(social.youtube),
            facebook: text(social.facebook),
            instagram: text(social.instagram),
            twitter: text(social.twitter),
        },
        background_color: optional_text(req.background_color)
            .unwrap_or_else(|| DEFAULT_FOOTER_BACKGROUND.to_string()),
        text_color: optional_text(req.text_color).unwrap_or_else(|| DEFAULT_FOOTER_TEXT.to_string()),
    }
}

/// GET /api/settings/footer — created with defaults on first read.
pub async fn get_footer(State(state): State<AppState>) -> ApiResult<Json<Record<FooterSettings>>> {
    let footer = with_db(&state, |db| Ok(db.singleton_or_insert(FooterSettings::default)?)).await?;
    Ok(Json(footer))
}

pub async fn save_footer(
    State(state): State<AppState>,
    Json(req): Json<FooterRequest>,
) -> ApiResult<impl IntoResponse> {
    let footer = footer_from_request(req);
    let (saved, existed) = with_db(&state, move |db| {
        let existed = db.singleton::<FooterSettings>()?.is_some();
        Ok((db.put_singleton(&footer)?, existed))
    })
    .await?;

    let msg = if existed {
        "Footer settings updated successfully"
    } else {
        "Footer settings created successfully"
    };
    envelope(msg, "settings", &saved)
}

/// DELETE /api/settings/footer — back to the default footer.
pub async fn reset_footer(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let footer = with_db(&state, |db| Ok(db.reset_singleton(&FooterSettings::default())?)).await?;
    info!("Footer settings reset");
    envelope("Footer settings reset successfully", "settings", &footer)
}

async fn current_colors(state: &AppState) -> ApiResult<ColorSettings> {
    let colors = with_db(state, |db| Ok(db.singleton::<ColorSettings>()?)).await?;
    Ok(colors.map(|r| r.doc).unwrap_or_default())
}

pub async fn get_colors(State(state): State<AppState>) -> ApiResult<Json<ColorSettings>> {
    Ok(Json(current_colors(&state).await?))
}

/// POST /api/settings/colors. Omitted colours keep their current value.
pub async fn save_colors(
    State(state): State<AppState>,
    Json(req): Json<ColorRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut colors = current_colors(&state).await?;
    for (slot, value) in [
        (&mut colors.primary, req.primary),
        (&mut colors.secondary, req.secondary),
        (&mut colors.accent, req.accent),
        (&mut colors.text, req.text),
        (&mut colors.background, req.background),
    ] {
        if let Some(value) = optional_text(value) {
            *slot = value;
        }
    }

    let saved = with_db(&state, move |db| Ok(db.put_singleton(&colors)?)).await?;
    info!("Site colours updated");
    envelope("Colors updated successfully", "colors", &saved.doc)
}

/// GET /api/settings/colors/variables.scss — the palette as SCSS variables.
pub async fn colors_scss(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let colors = current_colors(&state).await?;
    Ok(([(header::CONTENT_TYPE, "text/x-scss; charset=utf-8")], colors.to_scss()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use showroom_types::api::SocialMediaRequest;

    #[test]
    fn missing_social_links_and_colours_get_defaults() {
        let req = FooterRequest {
            columns: None,
            social_media: Some(SocialMediaRequest {
                youtube: Some("https://youtube.com/@shop".into()),
                ..Default::default()
            }),
            background_color: None,
            text_color: Some("".into()),
        };

        let footer = footer_from_request(req);
        assert!(footer.columns.is_empty());
        assert_eq!(footer.social_media.youtube, "https://youtube.com/@shop");
        assert_eq!(footer.social_media.facebook, "");
        assert_eq!(footer.social_media.twitter, "");
        assert_eq!(footer.background_color, DEFAULT_FOOTER_BACKGROUND);
        assert_eq!(footer.text_color, DEFAULT_FOOTER_TEXT);
    }
}
