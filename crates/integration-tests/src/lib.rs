//! End-to-end tests for the AgriMap storefront client.
//!
//! [`FakeBackend`] is an in-memory axum implementation of the marketplace
//! REST API, bound to an ephemeral port. Tests drive the real `reqwest`
//! client against it; nothing outside the process is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p agrimap-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = FakeBackend::start().await?;
//! let storefront = backend.storefront()?;
//!
//! let page = storefront.load(&backend.page("/")).await;
//! assert_eq!(page.page, PageState::Shop);
//! ```

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use agrimap_core::{
    CartItem, CartItemId, CartLine, CheckoutStatus, Coordinates, PaymentSession, PaymentSessionId,
    PaymentStatus, Product, ProductId, SessionId, StateInfo, User,
};
use agrimap_storefront::config::PollConfig;
use agrimap_storefront::{AppError, Storefront, StorefrontConfig};

/// Cookie the fake backend uses for auth sessions.
pub const SESSION_COOKIE: &str = "session_token";

// =============================================================================
// Fake Backend
// =============================================================================

/// Running fake backend. The server stops when this is dropped.
pub struct FakeBackend {
    url: Url,
    shared: Shared,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Start a backend seeded with states and products.
    ///
    /// # Errors
    ///
    /// Returns error if no local port can be bound.
    pub async fn start() -> std::io::Result<Self> {
        let shared = Shared::default();
        shared.lock().seed();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = router(shared.clone());

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake backend stopped");
            }
        });

        let url = Url::parse(&format!("http://{addr}"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        Ok(Self {
            url,
            shared,
            server,
        })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Page URL on the storefront origin, e.g. `page("/profile#session_id=x")`.
    ///
    /// # Panics
    ///
    /// Panics if `path` cannot be joined onto the origin.
    #[must_use]
    pub fn page(&self, path: &str) -> Url {
        self.origin().join(path).expect("valid page path")
    }

    /// Origin the storefront pretends to be served from.
    #[must_use]
    pub fn origin(&self) -> Url {
        Url::parse("https://mapfresh.test").expect("valid origin")
    }

    /// Client configuration pointing at this backend with fast polling.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        let mut config = StorefrontConfig::for_api(self.url.clone());
        config.origin_url = self.origin();
        config.request_timeout = Duration::from_secs(5);
        config.poll = PollConfig {
            interval: Duration::from_millis(10),
            max_attempts: 5,
        };
        config
    }

    /// Storefront with a fresh cookie jar.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn storefront(&self) -> Result<Storefront, AppError> {
        Storefront::new(self.config())
    }

    /// Seeded product by name.
    #[must_use]
    pub fn product_id(&self, name: &str) -> Option<ProductId> {
        self.shared
            .lock()
            .products
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id.clone())
    }

    /// Requests served for a route name (e.g. `"cart"`, `"checkout_status"`).
    #[must_use]
    pub fn hits(&self, route: &str) -> usize {
        self.shared.lock().hits.get(route).copied().unwrap_or(0)
    }

    /// Session ids sent to the login endpoint, in order.
    #[must_use]
    pub fn login_requests(&self) -> Vec<String> {
        self.shared.lock().login_requests.clone()
    }

    /// Origins sent with checkout requests, in order.
    #[must_use]
    pub fn checkout_origins(&self) -> Vec<String> {
        self.shared
            .lock()
            .checkouts
            .iter()
            .map(|(_, checkout)| checkout.origin_url.clone())
            .collect()
    }

    /// Backend view of a session's cart: `(product_id, quantity)` pairs.
    #[must_use]
    pub fn cart_contents(&self, session: &SessionId) -> Vec<(ProductId, i64)> {
        self.shared
            .lock()
            .cart
            .iter()
            .filter(|item| &item.user_session == session)
            .map(|item| (item.product_id.clone(), item.quantity))
            .collect()
    }

    /// Let `POST /api/auth/login` accept `session_id` for `user`.
    pub fn accept_login(&self, session_id: &str, user: User) {
        self.shared
            .lock()
            .logins
            .insert(session_id.to_string(), user);
    }

    /// Only set the session cookie on login, without a bearer token in the body.
    pub fn cookie_only_login(&self) {
        self.shared.lock().cookie_only = true;
    }

    /// Queue checkout statuses; the last one repeats.
    pub fn script_statuses(&self, statuses: &[(PaymentStatus, CheckoutStatus)]) {
        self.shared
            .lock()
            .statuses
            .extend(statuses.iter().copied());
    }

    /// Queue raw status bodies, sent verbatim ahead of any scripted statuses;
    /// the last one repeats.
    pub fn script_raw_statuses(&self, bodies: &[Value]) {
        self.shared
            .lock()
            .raw_statuses
            .extend(bodies.iter().cloned());
    }

    /// Make the status endpoint answer 500.
    pub fn fail_status_checks(&self) {
        self.shared.lock().status_failure = true;
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A user the fake backend can sign in.
///
/// # Panics
///
/// Panics if the record does not decode as a [`User`].
#[must_use]
pub fn test_user(id: &str, name: &str, email: &str) -> User {
    serde_json::from_value(json!({ "id": id, "name": name, "email": email }))
        .expect("valid test user")
}

// =============================================================================
// Backend State
// =============================================================================

struct Checkout {
    id: String,
    origin_url: String,
}

#[derive(Default)]
struct Backend {
    states: BTreeMap<String, StateInfo>,
    products: Vec<Product>,
    cart: Vec<CartItem>,
    checkouts: Vec<(SessionId, Checkout)>,
    statuses: VecDeque<(PaymentStatus, CheckoutStatus)>,
    raw_statuses: VecDeque<Value>,
    status_failure: bool,
    logins: HashMap<String, User>,
    login_requests: Vec<String>,
    tokens: HashMap<String, User>,
    cookie_only: bool,
    hits: HashMap<String, usize>,
}

#[derive(Clone, Default)]
struct Shared(Arc<Mutex<Backend>>);

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, route: &str) -> MutexGuard<'_, Backend> {
        let mut backend = self.lock();
        *backend.hits.entry(route.to_string()).or_default() += 1;
        backend
    }
}

impl Backend {
    fn seed(&mut self) {
        for (slug, name, products, description, (x, y)) in [
            (
                "punjab",
                "Punjab",
                &["Wheat", "Basmati Rice", "Cotton", "Dairy Products"][..],
                "Known as the 'Granary of India', Punjab is famous for wheat and basmati rice production.",
                (-0.5, 0.8),
            ),
            (
                "maharashtra",
                "Maharashtra",
                &["Cotton", "Sugarcane", "Grapes", "Onions", "Turmeric"][..],
                "Maharashtra leads in cotton and sugarcane production, also famous for wine grapes.",
                (-0.2, 0.2),
            ),
            (
                "kerala",
                "Kerala",
                &["Spices", "Coconut", "Tea", "Coffee", "Cardamom", "Black Pepper"][..],
                "The 'Spice Garden of India', Kerala produces finest quality spices and coconut.",
                (0.1, -0.5),
            ),
            (
                "gujarat",
                "Gujarat",
                &["Cotton", "Groundnut", "Cumin", "Milk Products", "Dates"][..],
                "Largest producer of cotton and groundnut in India, also leading in dairy.",
                (-0.6, 0.3),
            ),
        ] {
            self.states.insert(
                slug.to_string(),
                StateInfo {
                    name: name.to_string(),
                    agricultural_products: products.iter().map(ToString::to_string).collect(),
                    description: description.to_string(),
                    coordinates: Coordinates { x, y, z: 0.0 },
                },
            );
        }

        for (name, price, state, category, farmer, stock, unit) in [
            ("Premium Basmati Rice", 120, "punjab", "Grains", "Harpreet Singh", 1000, "kg"),
            ("Golden Wheat", 25, "punjab", "Grains", "Sukhdev Kaur", 5000, "kg"),
            ("Organic Cotton", 80, "maharashtra", "Fiber", "Ramesh Patil", 2000, "kg"),
            ("Premium Cardamom", 1200, "kerala", "Spices", "Mohanan Nair", 50, "kg"),
            ("Black Pepper", 800, "kerala", "Spices", "Priya Menon", 100, "kg"),
            ("Fresh Coconuts", 30, "kerala", "Fruits", "Ravi Kumar", 1000, "pieces"),
            ("Groundnut Oil", 150, "gujarat", "Oils", "Kiran Patel", 500, "liters"),
        ] {
            self.products.push(Product {
                id: ProductId::new(uuid::Uuid::new_v4().to_string()),
                name: name.to_string(),
                description: format!("{name} straight from {farmer}'s farm"),
                price: Decimal::from(price),
                image_url: format!("https://images.example/{}.jpg", name.to_lowercase().replace(' ', "-")),
                state: state.to_string(),
                category: category.to_string(),
                farmer_name: farmer.to_string(),
                quantity_available: stock,
                unit: unit.to_string(),
            });
        }
    }

    fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<User> {
        session_token(headers).and_then(|token| self.tokens.get(&token).cloned())
    }
}

// =============================================================================
// Routes
// =============================================================================

/// FastAPI-style error: `{"detail": "..."}`.
struct Detail(StatusCode, &'static str);

impl IntoResponse for Detail {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "detail": self.1 }))).into_response()
    }
}

type Reply<T> = Result<Json<T>, Detail>;

fn router(shared: Shared) -> Router {
    let api = Router::new()
        .route("/states", get(states))
        .route("/states/{name}", get(state))
        .route("/products", get(products))
        .route("/products/{id}", get(product))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/{session}", get(cart))
        .route(
            "/cart/{session}/{product_id}",
            put(update_cart).delete(remove_from_cart),
        )
        .route("/checkout/create-session", post(create_checkout))
        .route("/checkout/status/{id}", get(checkout_status))
        .route("/auth/me", get(me))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout));

    Router::new().nest("/api", api).with_state(shared)
}

async fn states(State(shared): State<Shared>) -> Json<BTreeMap<String, StateInfo>> {
    Json(shared.enter("states").states.clone())
}

async fn state(State(shared): State<Shared>, Path(name): Path<String>) -> Reply<StateInfo> {
    shared
        .enter("state")
        .states
        .get(&name.to_lowercase())
        .cloned()
        .map(Json)
        .ok_or(Detail(StatusCode::NOT_FOUND, "State not found"))
}

#[derive(Deserialize)]
struct ProductQuery {
    state: Option<String>,
    category: Option<String>,
}

async fn products(
    State(shared): State<Shared>,
    Query(query): Query<ProductQuery>,
) -> Json<Vec<Product>> {
    let state = query.state.map(|s| s.to_lowercase());
    let backend = shared.enter("products");
    Json(
        backend
            .products
            .iter()
            .filter(|p| state.as_ref().is_none_or(|s| &p.state == s))
            .filter(|p| query.category.as_ref().is_none_or(|c| &p.category == c))
            .cloned()
            .collect(),
    )
}

async fn product(State(shared): State<Shared>, Path(id): Path<ProductId>) -> Reply<Product> {
    shared
        .enter("product")
        .product(&id)
        .cloned()
        .map(Json)
        .ok_or(Detail(StatusCode::NOT_FOUND, "Product not found"))
}

#[derive(Deserialize)]
struct AddToCart {
    product_id: ProductId,
    quantity: i64,
    user_session: SessionId,
}

async fn add_to_cart(State(shared): State<Shared>, Json(body): Json<AddToCart>) -> Reply<CartItem> {
    let mut backend = shared.enter("cart_add");
    if backend.product(&body.product_id).is_none() {
        return Err(Detail(StatusCode::NOT_FOUND, "Product not found"));
    }

    if let Some(item) = backend
        .cart
        .iter_mut()
        .find(|i| i.product_id == body.product_id && i.user_session == body.user_session)
    {
        item.quantity += body.quantity;
        return Ok(Json(item.clone()));
    }

    let item = CartItem {
        id: CartItemId::new(uuid::Uuid::new_v4().to_string()),
        product_id: body.product_id,
        quantity: body.quantity,
        user_session: body.user_session,
        user_id: None,
    };
    backend.cart.push(item.clone());
    Ok(Json(item))
}

async fn cart(State(shared): State<Shared>, Path(session): Path<SessionId>) -> Json<Vec<CartLine>> {
    let backend = shared.enter("cart");
    Json(
        backend
            .cart
            .iter()
            .filter(|item| item.user_session == session)
            .filter_map(|item| {
                backend.product(&item.product_id).map(|product| CartLine {
                    cart_item: item.clone(),
                    product: product.clone(),
                    total_price: product.price * Decimal::from(item.quantity),
                })
            })
            .collect(),
    )
}

#[derive(Deserialize)]
struct QuantityQuery {
    quantity: i64,
}

async fn update_cart(
    State(shared): State<Shared>,
    Path((session, product_id)): Path<(SessionId, ProductId)>,
    Query(query): Query<QuantityQuery>,
) -> Reply<Value> {
    let mut backend = shared.enter("cart_update");

    if query.quantity <= 0 {
        return remove_line(&mut backend, &session, &product_id);
    }

    let item = backend
        .cart
        .iter_mut()
        .find(|i| i.product_id == product_id && i.user_session == session)
        .ok_or(Detail(StatusCode::NOT_FOUND, "Cart item not found"))?;
    item.quantity = query.quantity;
    Ok(Json(json!({ "message": "Cart updated" })))
}

async fn remove_from_cart(
    State(shared): State<Shared>,
    Path((session, product_id)): Path<(SessionId, ProductId)>,
) -> Reply<Value> {
    let mut backend = shared.enter("cart_remove");
    remove_line(&mut backend, &session, &product_id)
}

fn remove_line(backend: &mut Backend, session: &SessionId, product_id: &ProductId) -> Reply<Value> {
    let before = backend.cart.len();
    backend
        .cart
        .retain(|i| !(&i.product_id == product_id && &i.user_session == session));
    if backend.cart.len() == before {
        return Err(Detail(StatusCode::NOT_FOUND, "Cart item not found"));
    }
    Ok(Json(json!({ "message": "Item removed from cart" })))
}

#[derive(Deserialize)]
struct CreateCheckout {
    origin_url: String,
    user_session: SessionId,
}

async fn create_checkout(
    State(shared): State<Shared>,
    Json(body): Json<CreateCheckout>,
) -> Reply<Value> {
    let mut backend = shared.enter("checkout_create");
    if !backend.cart.iter().any(|i| i.user_session == body.user_session) {
        return Err(Detail(StatusCode::BAD_REQUEST, "Cart is empty"));
    }

    let id = format!("cs_test_{}", uuid::Uuid::new_v4().simple());
    let url = format!("https://checkout.payments.test/pay/{id}");
    backend.checkouts.push((
        body.user_session,
        Checkout {
            id: id.clone(),
            origin_url: body.origin_url,
        },
    ));

    Ok(Json(json!({ "url": url, "session_id": id })))
}

async fn checkout_status(
    State(shared): State<Shared>,
    Path(id): Path<String>,
) -> Result<Response, Detail> {
    let mut backend = shared.enter("checkout_status");
    if backend.status_failure {
        return Err(Detail(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Payment provider unavailable",
        ));
    }

    let raw = if backend.raw_statuses.len() > 1 {
        backend.raw_statuses.pop_front()
    } else {
        backend.raw_statuses.front().cloned()
    };
    if let Some(body) = raw {
        return Ok(Json(body).into_response());
    }
    if !backend.checkouts.iter().any(|(_, c)| c.id == id) && backend.statuses.is_empty() {
        return Err(Detail(StatusCode::NOT_FOUND, "Payment session not found"));
    }

    let (payment_status, status) = if backend.statuses.len() > 1 {
        backend.statuses.pop_front()
    } else {
        backend.statuses.front().copied()
    }
    .unwrap_or((PaymentStatus::Unpaid, CheckoutStatus::Open));

    let amount_total = backend
        .checkouts
        .iter()
        .find(|(_, c)| c.id == id)
        .map(|(session, _)| {
            backend
                .cart
                .iter()
                .filter(|i| &i.user_session == session)
                .filter_map(|i| {
                    backend
                        .product(&i.product_id)
                        .map(|p| p.price * Decimal::from(i.quantity))
                })
                .sum::<Decimal>()
        });

    Ok(Json(PaymentSession {
        session_id: Some(PaymentSessionId::new(id)),
        payment_status,
        status,
        amount_total,
        currency: Some("inr".to_string()),
    })
    .into_response())
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer.or_else(|| {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .find_map(|pair| {
                pair.trim()
                    .strip_prefix(SESSION_COOKIE)
                    .and_then(|rest| rest.strip_prefix('='))
                    .map(str::to_string)
            })
    })
}

async fn me(State(shared): State<Shared>, headers: HeaderMap) -> Reply<User> {
    shared
        .enter("me")
        .user_for(&headers)
        .map(Json)
        .ok_or(Detail(StatusCode::UNAUTHORIZED, "Not authenticated"))
}

#[derive(Deserialize)]
struct Login {
    session_id: String,
}

async fn login(State(shared): State<Shared>, Json(body): Json<Login>) -> Result<Response, Detail> {
    let mut backend = shared.enter("login");
    backend.login_requests.push(body.session_id.clone());

    let user = backend
        .logins
        .get(&body.session_id)
        .cloned()
        .ok_or(Detail(StatusCode::UNAUTHORIZED, "Invalid session ID"))?;

    let token = uuid::Uuid::new_v4().to_string();
    backend.tokens.insert(token.clone(), user.clone());

    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    let body = if backend.cookie_only {
        json!({ "user": user })
    } else {
        json!({ "user": user, "session_token": token })
    };

    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

async fn logout(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = shared.enter("logout");
    if let Some(token) = session_token(&headers) {
        backend.tokens.remove(&token);
    }

    let cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0");
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response()
}
