//! Venue profile page, the multipart property update and the owner and
//! bank account forms.

use crate::{
    errors::AppError,
    forms::{self, FormFields},
    handlers::context::OwnerContext,
    models::{
        property::{ImageRef, MAX_IMAGES, PropertyProfile},
        session::Flash,
        user::{BankAccount, Owner},
    },
    services::media_service::{MediaError, ProfileUpdate},
    state::AppState,
};
use axum::{
    Form, Json,
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tracing::{debug, warn};

/// File field carrying new photos.
pub const IMAGES_FIELD: &str = "images";

const PROFILE_PATH: &str = "/profile";
const SAVED: &str = "Property details saved.";
const STORE_FAILURE: &str = "Could not update the property. Please try again.";
const UPDATED: &str = "Updated successfully.";
const EMAIL_TAKEN: &str = "Email is already in use.";
const ACCOUNT_FAILURE: &str = "Could not update your details. Please try again.";

#[derive(Serialize)]
pub struct ProfileView {
    pub user: Owner,
    pub flash: Option<Flash>,
    pub property: Option<PropertyProfile>,
    pub account: Option<BankAccount>,
}

/// `GET /profile`
pub async fn show_profile(
    State(state): State<AppState>,
    ctx: OwnerContext,
) -> Result<Json<ProfileView>, AppError> {
    let property = state.properties.find_by_owner(ctx.owner.id).await?;
    let account = state.identities.find_bank_account(ctx.owner.id).await?;
    let flash = ctx.take_flash(&state).await;
    Ok(Json(ProfileView {
        user: ctx.owner,
        flash,
        property,
        account,
    }))
}

/// `POST /profile/owner`
pub async fn update_owner_details(
    State(state): State<AppState>,
    ctx: OwnerContext,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let fields: FormFields = pairs.into_iter().collect();
    let flash = match forms::owner_details(&fields) {
        Err(err) => Flash::error(err.to_string()),
        Ok(details) => match state.identities.update_owner(ctx.owner.id, &details).await {
            Ok(Some(_)) => Flash::success(UPDATED),
            Ok(None) => {
                warn!("owner {} vanished during a profile update", ctx.owner.id);
                Flash::error(ACCOUNT_FAILURE)
            }
            Err(err) if err.is_unique_violation() => Flash::error(EMAIL_TAKEN),
            Err(err) => {
                warn!("could not update owner {}: {}", ctx.owner.id, err);
                Flash::error(ACCOUNT_FAILURE)
            }
        },
    };
    ctx.flash(&state, flash).await;
    Redirect::to(PROFILE_PATH).into_response()
}

/// `POST /profile/bankaccount`
pub async fn update_bank_account(
    State(state): State<AppState>,
    ctx: OwnerContext,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let fields: FormFields = pairs.into_iter().collect();
    let flash = match forms::bank_details(&fields) {
        Err(err) => Flash::error(err.to_string()),
        Ok(details) => match state.identities.upsert_bank_account(ctx.owner.id, &details).await {
            Ok(_) => Flash::success(UPDATED),
            Err(err) => {
                warn!("could not save bank account of owner {}: {}", ctx.owner.id, err);
                Flash::error(ACCOUNT_FAILURE)
            }
        },
    };
    ctx.flash(&state, flash).await;
    Redirect::to(PROFILE_PATH).into_response()
}

/// `POST /profile/prop`
///
/// Photos are stored as they stream in; if the submission is rejected before
/// it reaches [`MediaLifecycleManager::apply`](crate::services::media_service::MediaLifecycleManager::apply)
/// they are discarded again.
pub async fn update_profile(
    State(state): State<AppState>,
    ctx: OwnerContext,
    multipart: Multipart,
) -> Response {
    let flash = match submit(&state, &ctx, multipart).await {
        Ok(()) => Flash::success(SAVED),
        Err(Rejected(message)) => Flash::error(message),
    };
    ctx.flash(&state, flash).await;
    Redirect::to(PROFILE_PATH).into_response()
}

/// Message shown to the owner when a submission fails.
struct Rejected(String);

impl From<MediaError> for Rejected {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Validation(message) => Rejected(message),
            _ => Rejected(STORE_FAILURE.into()),
        }
    }
}

async fn submit(
    state: &AppState,
    ctx: &OwnerContext,
    mut multipart: Multipart,
) -> Result<(), Rejected> {
    let mut fields = FormFields::default();
    let mut uploads: Vec<ImageRef> = Vec::new();

    let read: Result<(), Rejected> = async {
        while let Some(field) = multipart.next_field().await.map_err(|err| {
            warn!("unreadable profile form from owner {}: {}", ctx.owner.id, err);
            Rejected("Could not read the submitted form.".into())
        })? {
            let name = field.name().unwrap_or_default().to_string();
            if name == IMAGES_FIELD {
                let file_name = field.file_name().map(String::from);
                let content_type = field.content_type().map(String::from);
                let data = field.bytes().await.map_err(|err| {
                    warn!("upload from owner {} interrupted: {}", ctx.owner.id, err);
                    Rejected("Could not read the uploaded image.".into())
                })?;
                // Browsers submit an empty part for an untouched file input.
                if data.is_empty() && file_name.as_deref().unwrap_or_default().is_empty() {
                    continue;
                }
                if uploads.len() >= MAX_IMAGES {
                    debug!("ignoring image past the per-request limit");
                    continue;
                }
                let image = state
                    .media
                    .stage_upload(file_name.as_deref(), content_type.as_deref(), data)
                    .await?;
                uploads.push(image);
            } else {
                let value = field.text().await.map_err(|err| {
                    warn!("unreadable form field `{}`: {}", name, err);
                    Rejected("Could not read the submitted form.".into())
                })?;
                fields.push(name, value);
            }
        }
        Ok(())
    }
    .await;

    let attributes = read.and_then(|()| {
        forms::property_attributes(&fields).map_err(|err| Rejected(err.to_string()))
    });
    let attributes = match attributes {
        Ok(attributes) => attributes,
        Err(rejected) => {
            state.media.discard_uploads(&uploads).await;
            return Err(rejected);
        }
    };

    let update = ProfileUpdate {
        attributes,
        uploads,
        delete_flags: forms::delete_flags(&fields),
    };
    state.media.apply(ctx.owner.id, update).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        handlers::test_support::{TestApp, body_json},
        models::property::MAX_IMAGES,
    };
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use serde_json::Value;

    const BOUNDARY: &str = "venue-form-boundary";

    fn text_fields() -> Vec<(&'static str, &'static str)> {
        vec![
            ("propname", "Grand Hall"),
            ("address", "12 park street"),
            ("city", "kolkata"),
            ("state", "west bengal"),
            ("pincode", "700016"),
            ("contact", "9830000000"),
            ("size", "4000"),
            ("capacity", "300"),
            ("cost", "50000"),
            ("Wedding", "on"),
        ]
    }

    fn multipart_body(texts: &[(&str, &str)], images: &[(&str, &str)]) -> Body {
        let mut body = String::new();
        for (name, value) in texts {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        for (file_name, content_type) in images {
            // An untouched file input sends no name and no bytes.
            let data = if file_name.is_empty() { "" } else { "fake image bytes" };
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n{data}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Body::from(body)
    }

    fn submit_request(token: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/profile/prop")
            .header(header::COOKIE, format!("user-session={token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .unwrap()
    }

    async fn post_form(app: &TestApp, uri: &str, token: &str, body: impl Into<String>) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::COOKIE, format!("user-session={token}"))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.into()))
            .unwrap();
        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/profile");
    }

    async fn profile(app: &TestApp, token: &str) -> Value {
        let response = app.get("/profile", Some(token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }

    #[tokio::test]
    async fn profile_requires_an_owner_session() {
        let app = TestApp::new().await;
        let response = app.get("/profile", None).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");

        let customer_token = app.customer_session().await;
        let response = app.get("/profile", Some(&customer_token)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn submission_creates_the_property_with_uploaded_photos() {
        let app = TestApp::new().await;
        let (_, token) = app.owner_session().await;

        let response = app
            .send(submit_request(
                &token,
                multipart_body(
                    &text_fields(),
                    &[("front.JPG", "image/jpeg"), ("", "application/octet-stream")],
                ),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/profile");

        let view = profile(&app, &token).await;
        assert_eq!(view["flash"]["kind"], "success");
        assert_eq!(view["property"]["name"], "GRAND HALL");
        let images = view["property"]["images"].as_array().unwrap();
        assert_eq!(images.len(), 1);
        let filename = images[0]["filename"].as_str().unwrap();
        assert!(filename.ends_with(".jpg"));
        assert_eq!(
            images[0]["url"],
            format!("http://venues.test/api/image/props/{filename}")
        );

        // The flash is shown once.
        assert!(profile(&app, &token).await["flash"].is_null());

        let response = app
            .get(&format!("/api/image/props/{filename}"), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    }

    #[tokio::test]
    async fn flagged_photos_are_removed_and_the_list_stays_capped() {
        let app = TestApp::new().await;
        let (_, token) = app.owner_session().await;

        let six = [("a.png", "image/png"); 6];
        app.send(submit_request(&token, multipart_body(&text_fields(), &six)))
            .await;
        let view = profile(&app, &token).await;
        let images = view["property"]["images"].as_array().unwrap().clone();
        assert_eq!(images.len(), MAX_IMAGES);

        let first = images[0]["filename"].as_str().unwrap().to_string();
        let mut texts = text_fields();
        texts.push(("delete_image", first.as_str()));
        app.send(submit_request(&token, multipart_body(&texts, &[])))
            .await;

        let view = profile(&app, &token).await;
        let remaining: Vec<&str> = view["property"]["images"]
            .as_array()
            .unwrap()
            .iter()
            .map(|image| image["filename"].as_str().unwrap())
            .collect();
        assert_eq!(remaining.len(), MAX_IMAGES - 1);
        assert!(!remaining.contains(&first.as_str()));

        let response = app.get(&format!("/api/image/props/{first}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_form_discards_the_uploads() {
        let app = TestApp::new().await;
        let (_, token) = app.owner_session().await;

        let mut texts = text_fields();
        texts.retain(|(name, _)| *name != "city");
        app.send(submit_request(
            &token,
            multipart_body(&texts, &[("a.png", "image/png")]),
        ))
        .await;

        let view = profile(&app, &token).await;
        assert_eq!(view["flash"]["kind"], "error");
        assert_eq!(view["flash"]["message"], "City is required.");
        assert!(view["property"].is_null());
        assert_eq!(app.blob_count().await, 0);
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let app = TestApp::new().await;
        let (_, token) = app.owner_session().await;

        app.send(submit_request(
            &token,
            multipart_body(
                &text_fields(),
                &[("a.png", "image/png"), ("notes.txt", "text/plain")],
            ),
        ))
        .await;

        let view = profile(&app, &token).await;
        assert_eq!(view["flash"]["message"], "Only image files can be uploaded.");
        assert!(view["property"].is_null());
        assert_eq!(app.blob_count().await, 0);
    }

    #[tokio::test]
    async fn owner_details_are_normalized_and_saved() {
        let app = TestApp::new().await;
        let (owner, token) = app.owner_session().await;

        post_form(
            &app,
            "/profile/owner",
            &token,
            "first_name=priya&last_name=das&email=Priya%40Venues.Test&phone=9830099999&pan_num=zzzzz9999z",
        )
        .await;

        let view = profile(&app, &token).await;
        assert_eq!(view["flash"]["kind"], "success");
        assert_eq!(view["flash"]["message"], "Updated successfully.");
        assert_eq!(view["user"]["id"], owner.id.to_string());
        assert_eq!(view["user"]["first_name"], "PRIYA");
        assert_eq!(view["user"]["last_name"], "DAS");
        assert_eq!(view["user"]["email"], "priya@venues.test");
        assert_eq!(view["user"]["phone"], "9830099999");
        assert_eq!(view["user"]["pan"], "ZZZZZ9999Z");
    }

    #[tokio::test]
    async fn rejected_owner_details_leave_the_account_unchanged() {
        let app = TestApp::new().await;
        let (owner, token) = app.owner_session().await;

        post_form(
            &app,
            "/profile/owner",
            &token,
            "first_name=priya&email=not-an-email&phone=9830099999",
        )
        .await;
        let view = profile(&app, &token).await;
        assert_eq!(view["flash"]["kind"], "error");
        assert_eq!(view["flash"]["message"], "Email is not valid.");
        assert_eq!(view["user"]["first_name"], owner.first_name.as_str());

        let (other, _) = app.owner_session().await;
        let body = format!("first_name=priya&email={}&phone=9830099999", other.email);
        post_form(&app, "/profile/owner", &token, body).await;
        let view = profile(&app, &token).await;
        assert_eq!(view["flash"]["message"], "Email is already in use.");
        assert_eq!(view["user"]["email"], owner.email.as_str());
    }

    #[tokio::test]
    async fn bank_account_is_created_then_replaced() {
        let app = TestApp::new().await;
        let (owner, token) = app.owner_session().await;
        assert!(profile(&app, &token).await["account"].is_null());

        post_form(
            &app,
            "/profile/bankaccount",
            &token,
            "acholdername=anita+sen&acnum=001122334455&ifsc=sbin0001234",
        )
        .await;
        let view = profile(&app, &token).await;
        assert_eq!(view["flash"]["message"], "Updated successfully.");
        assert_eq!(view["account"]["owner_id"], owner.id.to_string());
        assert_eq!(view["account"]["name"], "ANITA SEN");
        assert_eq!(view["account"]["ifsc"], "SBIN0001234");

        post_form(
            &app,
            "/profile/bankaccount",
            &token,
            "acholdername=anita+sen&acnum=998877&ifsc=HDFC0000001",
        )
        .await;
        let view = profile(&app, &token).await;
        assert_eq!(view["account"]["account_number"], "998877");
        assert_eq!(view["account"]["ifsc"], "HDFC0000001");
    }

    #[tokio::test]
    async fn invalid_bank_account_is_not_saved() {
        let app = TestApp::new().await;
        let (_, token) = app.owner_session().await;

        post_form(
            &app,
            "/profile/bankaccount",
            &token,
            "acholdername=anita+sen&acnum=12AB34&ifsc=SBIN0001234",
        )
        .await;
        let view = profile(&app, &token).await;
        assert_eq!(view["flash"]["kind"], "error");
        assert_eq!(view["flash"]["message"], "Account number must be numeric.");
        assert!(view["account"].is_null());
    }
}
