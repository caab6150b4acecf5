//! Rocket routes exposing the preview pipeline.

use std::convert::Infallible;
use std::io::Cursor;
use std::sync::Arc;

use rocket::http::uri::{fmt::Path as UriPath, Segments};
use rocket::http::Status;
use rocket::request::{self, FromRequest, Request};
use rocket::response::{self, Responder, Response};
use rocket::{get, routes, Build, Rocket, State};
use tracing::{debug, error};

use crate::auth::Authenticator;
use crate::preview::{PreviewBody, PreviewHandler, PreviewRequest, PreviewResponse, Validators};
use crate::{PreviewError, User};

pub struct AppState {
    pub handler: Arc<PreviewHandler>,
    pub auth: Arc<dyn Authenticator>,
}

/// Mounts the preview routes under `/api` on an existing rocket.
pub fn mount(rocket: Rocket<Build>, state: AppState) -> Rocket<Build> {
    rocket.manage(state).mount("/api", routes![preview])
}

pub fn build(state: AppState) -> Rocket<Build> {
    mount(rocket::build(), state)
}

#[get("/preview/<size>/<path..>?<inline>")]
async fn preview(
    size: &str,
    path: Segments<'_, UriPath>,
    inline: Option<bool>,
    user: AuthedUser,
    validators: Validators,
    state: &State<AppState>,
) -> Result<PreviewResponse, PreviewError> {
    let path = format!("/{}", path.collect::<Vec<_>>().join("/"));
    let request = PreviewRequest::new(user.0, size, path)
        .with_inline(inline.unwrap_or(false))
        .with_validators(validators);
    state.handler.handle(request).await
}

pub struct AuthedUser(pub User);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthedUser {
    type Error = PreviewError;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Some(state) = req.rocket().state::<AppState>() else {
            let err = PreviewError::Unauthorized("no authenticator configured".to_string());
            return request::Outcome::Error((Status::InternalServerError, err));
        };

        match state.auth.authenticate(req.headers()).await {
            Ok(user) => request::Outcome::Success(AuthedUser(user)),
            Err(e) => {
                debug!(error = %e, "authentication failed");
                request::Outcome::Error((e.status(), e))
            }
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Validators {
    type Error = Infallible;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let headers = req.headers();
        request::Outcome::Success(Validators {
            if_none_match: headers.get_one("If-None-Match").map(str::to_string),
            if_modified_since: headers.get_one("If-Modified-Since").map(str::to_string),
        })
    }
}

impl<'r> Responder<'r, 'static> for PreviewResponse {
    fn respond_to(self, _request: &'r Request<'_>) -> response::Result<'static> {
        let mut response = Response::build();
        response.status(self.status);
        for header in self.headers {
            response.header(header);
        }
        match self.body {
            PreviewBody::Empty => {}
            PreviewBody::Bytes(bytes) => {
                response.sized_body(bytes.len(), Cursor::new(bytes));
            }
            PreviewBody::Stream(reader) => {
                response.streamed_body(reader);
            }
        }
        response.ok()
    }
}

impl<'r> Responder<'r, 'static> for PreviewError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            error!(uri = %request.uri(), error = %self, "preview request failed");
        } else {
            debug!(uri = %request.uri(), error = %self, %status, "preview request rejected");
        }
        Err(status)
    }
}
