// API Surface - REST endpoints over the stores and the shopping list pipeline
//
// Handlers resolve the caller once (token → user) and pass the user id down
// explicitly. Every handler works on the single shared SQLite connection.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::entities::ingredient::{get_ingredient, search_ingredients};
use crate::entities::recipe::{
    create_recipe, delete_recipe, get_recipe, list_recipes, update_recipe, MinRecipe, RecipeInput,
    RecipeView,
};
use crate::entities::tag::{get_tag, list_tags};
use crate::entities::user::{
    authenticate, get_user, issue_token, list_users, register_user, revoke_token, set_password,
    user_for_token, NewUser, User, UserView,
};
use crate::error::{AppError, AppResult};
use crate::export::{export_pdf, PDF_CONTENT_TYPE, SHOPPING_LIST_FILENAME};
use crate::membership::{Favorites, Follows, MembershipRelation, ShoppingCart};
use crate::shopping_list::shopping_list_for_user;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    /// Lock the connection. A poisoned lock still holds a usable connection.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// `Authorization: Token <key>`
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let key = value.strip_prefix("Token ")?.trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

/// Caller that must be authenticated
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

/// Caller that may be anonymous. A token that is present but unknown is rejected.
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|user| user.id)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(key) = token_from_headers(&parts.headers) else {
            return Ok(MaybeUser(None));
        };

        match user_for_token(&state.conn(), &key)? {
            Some(user) => Ok(MaybeUser(Some(user))),
            None => Err(AppError::NotAuthenticated),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or(AppError::NotAuthenticated)?;
        let user = user_for_token(&state.conn(), &token)?.ok_or(AppError::NotAuthenticated)?;
        Ok(CurrentUser { user, token })
    }
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct TokenResponse {
    auth_token: String,
}

#[derive(Deserialize)]
struct SetPasswordRequest {
    new_password: String,
    current_password: String,
}

#[derive(Deserialize)]
struct IngredientQuery {
    #[serde(default)]
    name: String,
}

// ============================================================================
// Health & auth handlers
// ============================================================================

/// GET /api/health
async fn health_check() -> impl IntoResponse {
    ApiResponse::ok("OK")
}

/// POST /api/auth/token/login/
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let conn = state.conn();
    let user = authenticate(&conn, &body.email, &body.password)?;
    let auth_token = issue_token(&conn, user.id)?;
    info!("User {} logged in", user.id);
    Ok(ApiResponse::ok(TokenResponse { auth_token }))
}

/// POST /api/auth/token/logout/
async fn logout(State(state): State<AppState>, caller: CurrentUser) -> AppResult<StatusCode> {
    revoke_token(&state.conn(), &caller.token)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// User handlers
// ============================================================================

/// POST /api/users/
async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<NewUser>,
) -> AppResult<impl IntoResponse> {
    let conn = state.conn();
    let user = register_user(&conn, &body)?;
    info!("Registered user {}", user.id);
    let view = UserView::for_viewer(&conn, user, None)?;
    Ok((StatusCode::CREATED, ApiResponse::ok(view)))
}

/// GET /api/users/
async fn get_users(State(state): State<AppState>, viewer: MaybeUser) -> AppResult<impl IntoResponse> {
    let conn = state.conn();
    let views = list_users(&conn)?
        .into_iter()
        .map(|user| UserView::for_viewer(&conn, user, viewer.id()))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(ApiResponse::ok(views))
}

/// GET /api/users/:id/
async fn get_user_by_id(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(user_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let conn = state.conn();
    let view = UserView::for_viewer(&conn, get_user(&conn, user_id)?, viewer.id())?;
    Ok(ApiResponse::ok(view))
}

/// GET /api/users/me/
async fn get_me(State(state): State<AppState>, caller: CurrentUser) -> AppResult<impl IntoResponse> {
    let conn = state.conn();
    let viewer = Some(caller.user.id);
    let view = UserView::for_viewer(&conn, caller.user, viewer)?;
    Ok(ApiResponse::ok(view))
}

/// POST /api/users/set_password/
async fn change_password(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(body): Json<SetPasswordRequest>,
) -> AppResult<StatusCode> {
    set_password(
        &state.conn(),
        caller.user.id,
        &body.current_password,
        &body.new_password,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/subscriptions/
async fn get_subscriptions(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let conn = state.conn();
    let views = Follows::new(&conn)
        .authors(caller.user.id)?
        .into_iter()
        .map(|author_id| UserView::for_viewer(&conn, get_user(&conn, author_id)?, Some(caller.user.id)))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(ApiResponse::ok(views))
}

/// POST /api/users/:id/subscribe/
async fn subscribe(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(author_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let conn = state.conn();
    Follows::new(&conn).add(caller.user.id, author_id)?;
    let view = UserView::for_viewer(&conn, get_user(&conn, author_id)?, Some(caller.user.id))?;
    Ok((StatusCode::CREATED, ApiResponse::ok(view)))
}

/// DELETE /api/users/:id/subscribe/
async fn unsubscribe(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(author_id): Path<i64>,
) -> AppResult<StatusCode> {
    Follows::new(&state.conn()).remove(caller.user.id, author_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Tag & ingredient handlers
// ============================================================================

/// GET /api/tags/
async fn get_tags(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(list_tags(&state.conn())?))
}

/// GET /api/tags/:id/
async fn get_tag_by_id(
    State(state): State<AppState>,
    Path(tag_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(get_tag(&state.conn(), tag_id)?))
}

/// GET /api/ingredients/?name=<prefix>
async fn get_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(search_ingredients(&state.conn(), &query.name)?))
}

/// GET /api/ingredients/:id/
async fn get_ingredient_by_id(
    State(state): State<AppState>,
    Path(ingredient_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(get_ingredient(&state.conn(), ingredient_id)?))
}

// ============================================================================
// Recipe handlers
// ============================================================================

/// GET /api/recipes/
async fn get_recipes(State(state): State<AppState>, viewer: MaybeUser) -> AppResult<impl IntoResponse> {
    let conn = state.conn();
    let views = list_recipes(&conn)?
        .into_iter()
        .map(|recipe| RecipeView::build(&conn, recipe, viewer.id()))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(ApiResponse::ok(views))
}

/// POST /api/recipes/
async fn post_recipe(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(body): Json<RecipeInput>,
) -> AppResult<impl IntoResponse> {
    let conn = state.conn();
    let recipe = create_recipe(&conn, caller.user.id, &body)?;
    info!("User {} created recipe {}", caller.user.id, recipe.id);
    let view = RecipeView::build(&conn, recipe, Some(caller.user.id))?;
    Ok((StatusCode::CREATED, ApiResponse::ok(view)))
}

/// GET /api/recipes/:id/
async fn get_recipe_by_id(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(recipe_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let conn = state.conn();
    let view = RecipeView::build(&conn, get_recipe(&conn, recipe_id)?, viewer.id())?;
    Ok(ApiResponse::ok(view))
}

/// PATCH /api/recipes/:id/
async fn patch_recipe(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(recipe_id): Path<i64>,
    Json(body): Json<RecipeInput>,
) -> AppResult<impl IntoResponse> {
    let conn = state.conn();
    let recipe = update_recipe(&conn, caller.user.id, recipe_id, &body)?;
    let view = RecipeView::build(&conn, recipe, Some(caller.user.id))?;
    Ok(ApiResponse::ok(view))
}

/// DELETE /api/recipes/:id/
async fn remove_recipe(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(recipe_id): Path<i64>,
) -> AppResult<StatusCode> {
    delete_recipe(&state.conn(), caller.user.id, recipe_id)?;
    info!("User {} deleted recipe {}", caller.user.id, recipe_id);
    Ok(StatusCode::NO_CONTENT)
}

fn add_to_list(
    conn: &Connection,
    relation: &dyn MembershipRelation,
    user_id: i64,
    recipe_id: i64,
) -> AppResult<Response> {
    relation.add(user_id, recipe_id)?;
    let recipe = MinRecipe::from(get_recipe(conn, recipe_id)?);
    Ok((StatusCode::CREATED, ApiResponse::ok(recipe)).into_response())
}

/// POST /api/recipes/:id/favorite/
async fn add_favorite(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(recipe_id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.conn();
    add_to_list(&conn, &Favorites::new(&conn), caller.user.id, recipe_id)
}

/// DELETE /api/recipes/:id/favorite/
async fn remove_favorite(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(recipe_id): Path<i64>,
) -> AppResult<StatusCode> {
    Favorites::new(&state.conn()).remove(caller.user.id, recipe_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/recipes/:id/shopping_cart/
async fn add_to_cart(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(recipe_id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.conn();
    add_to_list(&conn, &ShoppingCart::new(&conn), caller.user.id, recipe_id)
}

/// DELETE /api/recipes/:id/shopping_cart/
async fn remove_from_cart(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(recipe_id): Path<i64>,
) -> AppResult<StatusCode> {
    ShoppingCart::new(&state.conn()).remove(caller.user.id, recipe_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/recipes/download_shopping_cart/ - merged cart as a PDF attachment
async fn download_shopping_cart(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> AppResult<Response> {
    let lines = shopping_list_for_user(&state.conn(), caller.user.id)?;
    let document = export_pdf(&lines)?;

    info!(
        "Exported shopping list for user {}: {} ingredients, {} bytes",
        caller.user.id,
        lines.len(),
        document.len()
    );

    let headers = [
        (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", SHOPPING_LIST_FILENAME),
        ),
    ];

    Ok((StatusCode::OK, headers, document).into_response())
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/auth/token/login/", post(login))
        .route("/auth/token/logout/", post(logout))
        .route("/users/", get(get_users).post(create_user))
        .route("/users/me/", get(get_me))
        .route("/users/set_password/", post(change_password))
        .route("/users/subscriptions/", get(get_subscriptions))
        .route("/users/:id/", get(get_user_by_id))
        .route("/users/:id/subscribe/", post(subscribe).delete(unsubscribe))
        .route("/tags/", get(get_tags))
        .route("/tags/:id/", get(get_tag_by_id))
        .route("/ingredients/", get(get_ingredients))
        .route("/ingredients/:id/", get(get_ingredient_by_id))
        .route("/recipes/", get(get_recipes).post(post_recipe))
        .route("/recipes/download_shopping_cart/", get(download_shopping_cart))
        .route(
            "/recipes/:id/",
            get(get_recipe_by_id).patch(patch_recipe).delete(remove_recipe),
        )
        .route("/recipes/:id/favorite/", post(add_favorite).delete(remove_favorite))
        .route("/recipes/:id/shopping_cart/", post(add_to_cart).delete(remove_from_cart))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::entities::ingredient::create_test_ingredient;
    use crate::entities::recipe::recipe_input;
    use crate::entities::tag::create_test_tag;
    use crate::entities::user::create_test_user;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    struct Fixture {
        state: AppState,
        token: String,
        recipe_id: i64,
    }

    /// One user ("ann") with a token and one recipe by "bob" needing flour + sugar
    fn fixture() -> Fixture {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let ann = create_test_user(&conn, "ann");
        let bob = create_test_user(&conn, "bob");
        let tag = create_test_tag(&conn, "baking");
        let flour = create_test_ingredient(&conn, "flour", "g");
        let sugar = create_test_ingredient(&conn, "sugar", "g");
        let recipe = create_recipe(
            &conn,
            bob.id,
            &recipe_input("Cake", vec![tag.id], &[(flour.id, 200), (sugar.id, 50)]),
        )
        .unwrap();
        let token = issue_token(&conn, ann.id).unwrap();

        Fixture {
            state: AppState::new(conn),
            token,
            recipe_id: recipe.id,
        }
    }

    async fn send(state: &AppState, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        router(state.clone()).oneshot(request).await.unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_download_requires_auth() {
        let fx = fixture();
        let response = send(&fx.state, Method::GET, "/api/recipes/download_shopping_cart/", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &fx.state,
            Method::GET,
            "/api/recipes/download_shopping_cart/",
            Some("bogus"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_download_empty_cart_is_ok() {
        let fx = fixture();
        let response = send(
            &fx.state,
            Method::GET,
            "/api/recipes/download_shopping_cart/",
            Some(fx.token.as_str()),
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"shopping_list.pdf\""
        );

        let pdf = body_bytes(response).await;
        assert!(pdf.starts_with(b"%PDF"));
        let text = String::from_utf8_lossy(&pdf);
        assert_eq!(text.matches(") Tj").count(), 1);
    }

    #[tokio::test]
    async fn test_cart_flow_and_download() {
        let fx = fixture();
        let cart_uri = format!("/api/recipes/{}/shopping_cart/", fx.recipe_id);

        let response = send(&fx.state, Method::POST, &cart_uri, Some(fx.token.as_str()), None).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["data"]["name"], "Cake");

        let again = send(&fx.state, Method::POST, &cart_uri, Some(fx.token.as_str()), None).await;
        assert_eq!(again.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &fx.state,
            Method::GET,
            "/api/recipes/download_shopping_cart/",
            Some(fx.token.as_str()),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let text = String::from_utf8_lossy(&body_bytes(response).await).to_string();
        assert!(text.contains("(1. flour - 200 g) Tj"));
        assert!(text.contains("(2. sugar - 50 g) Tj"));

        let removed = send(&fx.state, Method::DELETE, &cart_uri, Some(fx.token.as_str()), None).await;
        assert_eq!(removed.status(), StatusCode::NO_CONTENT);
        let gone = send(&fx.state, Method::DELETE, &cart_uri, Some(fx.token.as_str()), None).await;
        assert_eq!(gone.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recipe_view_flags() {
        let fx = fixture();
        send(
            &fx.state,
            Method::POST,
            &format!("/api/recipes/{}/favorite/", fx.recipe_id),
            Some(fx.token.as_str()),
            None,
        )
        .await;

        let uri = format!("/api/recipes/{}/", fx.recipe_id);
        let seen = body_json(send(&fx.state, Method::GET, &uri, Some(fx.token.as_str()), None).await).await;
        let anonymous = body_json(send(&fx.state, Method::GET, &uri, None, None).await).await;

        assert_eq!(seen["data"]["is_favorited"], true);
        assert_eq!(seen["data"]["is_in_shopping_cart"], false);
        assert_eq!(anonymous["data"]["is_favorited"], false);
        assert_eq!(seen["data"]["ingredients"][0]["name"], "flour");
    }

    #[tokio::test]
    async fn test_missing_recipe_is_404() {
        let fx = fixture();
        let response = send(&fx.state, Method::POST, "/api/recipes/999/shopping_cart/", Some(fx.token.as_str()), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_only_author_deletes() {
        let fx = fixture();
        let response = send(
            &fx.state,
            Method::DELETE,
            &format!("/api/recipes/{}/", fx.recipe_id),
            Some(fx.token.as_str()),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_register_login_and_create_recipe() {
        let fx = fixture();

        let registered = send(
            &fx.state,
            Method::POST,
            "/api/users/",
            None,
            Some(serde_json::json!({
                "email": "cid@example.com",
                "username": "cid",
                "first_name": "Cid",
                "last_name": "Baker",
                "password": "hunter22"
            })),
        )
        .await;
        assert_eq!(registered.status(), StatusCode::CREATED);

        let login = send(
            &fx.state,
            Method::POST,
            "/api/auth/token/login/",
            None,
            Some(serde_json::json!({"email": "cid@example.com", "password": "hunter22"})),
        )
        .await;
        assert_eq!(login.status(), StatusCode::OK);
        let token = body_json(login).await["data"]["auth_token"].as_str().unwrap().to_string();

        let me = body_json(send(&fx.state, Method::GET, "/api/users/me/", Some(token.as_str()), None).await).await;
        assert_eq!(me["data"]["username"], "cid");

        let (tag_id, flour_id) = {
            let conn = fx.state.conn();
            (list_tags(&conn).unwrap()[0].id, search_ingredients(&conn, "flour").unwrap()[0].id)
        };
        let created = send(
            &fx.state,
            Method::POST,
            "/api/recipes/",
            Some(token.as_str()),
            Some(serde_json::json!({
                "name": "Bread",
                "text": "Knead",
                "cooking_time": 60,
                "tags": [tag_id],
                "ingredients": [{"id": flour_id, "amount": 500}]
            })),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let json = body_json(created).await;
        assert_eq!(json["data"]["author"]["username"], "cid");

        let logout = send(&fx.state, Method::POST, "/api/auth/token/logout/", Some(token.as_str()), None).await;
        assert_eq!(logout.status(), StatusCode::NO_CONTENT);
        let after = send(&fx.state, Method::GET, "/api/users/me/", Some(token.as_str()), None).await;
        assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_subscriptions() {
        let fx = fixture();
        let bob_id = {
            let conn = fx.state.conn();
            list_users(&conn).unwrap().into_iter().find(|u| u.username == "bob").unwrap().id
        };

        let uri = format!("/api/users/{bob_id}/subscribe/");
        let response = send(&fx.state, Method::POST, &uri, Some(fx.token.as_str()), None).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["data"]["is_subscribed"], true);

        let list = body_json(send(&fx.state, Method::GET, "/api/users/subscriptions/", Some(fx.token.as_str()), None).await).await;
        assert_eq!(list["data"][0]["username"], "bob");
    }

    #[tokio::test]
    async fn test_ingredient_search() {
        let fx = fixture();
        let json = body_json(send(&fx.state, Method::GET, "/api/ingredients/?name=su", None, None).await).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
        assert_eq!(json["data"][0]["measurement_unit"], "g");
    }
}
