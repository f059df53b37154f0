/// Authentication Routes
///
/// Handles cookie-based login, logout and session lookup.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::configuration::CookieSettings;
use crate::cookies::ResponseCookieJar;
use crate::error::AppError;
use crate::middleware::AuthenticatedIdentity;
use crate::session::SessionManager;
use crate::validators::{is_acceptable_password_input, is_valid_username};

/// Login form
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub identity: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub revoked: bool,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub identity: String,
}

/// POST /auth/login
///
/// Verify credentials and store a signed token in the auth cookie.
///
/// # Errors
/// - 400: Validation error (malformed username or password input)
/// - 401: Invalid credentials
/// - 500/503: Identity store failure
///
/// # Security Notes
/// - Same error for "unknown user" and "wrong password"
pub async fn login(
    req: HttpRequest,
    form: web::Form<LoginForm>,
    session: web::Data<SessionManager>,
    cookie_settings: web::Data<CookieSettings>,
) -> Result<HttpResponse, AppError> {
    let username = is_valid_username(&form.username)?;
    is_acceptable_password_input(&form.password)?;

    let max_age = session.authority().max_age();
    let mut jar = ResponseCookieJar::from_request(&req, cookie_settings.get_ref())
        .with_max_age(max_age);

    let identity = session.login(&username, &form.password, &mut jar).await?;

    let mut response = HttpResponse::Ok();
    jar.apply(&mut response);
    Ok(response.json(LoginResponse {
        identity,
        expires_in: max_age,
    }))
}

/// POST /auth/logout
///
/// Revoke the cookie's token and remove the cookie. Always succeeds.
pub async fn logout(
    req: HttpRequest,
    session: web::Data<SessionManager>,
    cookie_settings: web::Data<CookieSettings>,
) -> HttpResponse {
    let mut jar = ResponseCookieJar::from_request(&req, cookie_settings.get_ref());
    let revoked = session.logout(&mut jar);

    let mut response = HttpResponse::Ok();
    jar.apply(&mut response);
    response.json(LogoutResponse { revoked })
}

/// GET /auth/session
///
/// Identity of the current cookie session.
///
/// # Errors
/// - 401: `MISSING_TOKEN`, `MALFORMED_TOKEN`, `BAD_SIGNATURE`,
///   `TOKEN_EXPIRED` or `TOKEN_REVOKED`
pub async fn current_session(
    req: HttpRequest,
    session: web::Data<SessionManager>,
    cookie_settings: web::Data<CookieSettings>,
) -> Result<HttpResponse, AppError> {
    let jar = ResponseCookieJar::from_request(&req, cookie_settings.get_ref());
    let identity = session.current_identity(&jar)?;

    Ok(HttpResponse::Ok().json(SessionResponse { identity }))
}

/// GET /api/me
///
/// **Requires a valid token** (cookie or `Authorization: Bearer`);
/// the identity is injected by `TokenMiddleware`.
pub async fn me(identity: web::ReqData<AuthenticatedIdentity>) -> HttpResponse {
    HttpResponse::Ok().json(SessionResponse {
        identity: identity.into_inner().0,
    })
}
