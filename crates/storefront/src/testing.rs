//! In-memory `StorefrontApi` and clocks for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::Notify;

use agrimap_core::{
    CartItem, CartItemId, CartLine, CheckoutStatus, Coordinates, PaymentSession, PaymentSessionId,
    PaymentStatus, Product, ProductId, SessionId, StateInfo, User,
};

use crate::api::{ApiError, CheckoutRedirect, ProductFilter, StorefrontApi};
use crate::payment::Clock;

/// Backend operation, for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    States,
    State,
    Products,
    Product,
    AddToCart,
    Cart,
    UpdateCart,
    RemoveFromCart,
    CreateCheckout,
    CheckoutStatus,
    Me,
    Login,
    Logout,
}

#[derive(Default)]
struct Backend {
    products: Vec<Product>,
    states: BTreeMap<String, StateInfo>,
    carts: HashMap<String, Vec<CartItem>>,
    statuses: VecDeque<PaymentSession>,
    current_user: Option<User>,
    logins: HashMap<String, User>,
    failing: HashSet<Op>,
    calls: Vec<(Op, String)>,
    next_id: u64,
}

/// Fake backend with the same cart semantics as the real one: adds merge
/// into an existing line, a quantity of zero or less removes the line.
#[derive(Clone, Default)]
pub struct FakeApi {
    backend: Arc<Mutex<Backend>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_product(&self, product: Product) {
        self.backend.lock().unwrap().products.push(product);
    }

    pub fn add_state(&self, slug: &str, state: StateInfo) {
        self.backend
            .lock()
            .unwrap()
            .states
            .insert(slug.to_string(), state);
    }

    pub fn sign_in(&self, user: User) {
        self.backend.lock().unwrap().current_user = Some(user);
    }

    pub fn sign_out(&self) {
        self.backend.lock().unwrap().current_user = None;
    }

    /// Make `POST /api/auth/login` with `session_id` succeed with `user`.
    pub fn accept_login(&self, session_id: &str, user: User) {
        self.backend
            .lock()
            .unwrap()
            .logins
            .insert(session_id.to_string(), user);
    }

    /// Queue a status response. The last queued status repeats.
    pub fn push_status(&self, status: PaymentSession) {
        self.backend.lock().unwrap().statuses.push_back(status);
    }

    pub fn fail(&self, op: Op) {
        self.backend.lock().unwrap().failing.insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.backend.lock().unwrap().failing.remove(&op);
    }

    pub fn calls(&self, op: Op) -> usize {
        self.call_args(op).len()
    }

    pub fn call_args(&self, op: Op) -> Vec<String> {
        self.backend
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(called, _)| *called == op)
            .map(|(_, arg)| arg.clone())
            .collect()
    }

    pub fn current_user(&self) -> Option<User> {
        self.backend.lock().unwrap().current_user.clone()
    }

    fn enter(&self, op: Op, arg: impl Into<String>) -> Result<std::sync::MutexGuard<'_, Backend>, ApiError> {
        let mut backend = self.backend.lock().unwrap();
        backend.calls.push((op, arg.into()));
        if backend.failing.contains(&op) {
            return Err(ApiError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(backend)
    }
}

impl Backend {
    fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.products
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
    }
}

impl StorefrontApi for FakeApi {
    async fn states(&self) -> Result<BTreeMap<String, StateInfo>, ApiError> {
        Ok(self.enter(Op::States, "")?.states.clone())
    }

    async fn state(&self, name: &str) -> Result<StateInfo, ApiError> {
        self.enter(Op::State, name)?
            .states
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("State not found".to_string()))
    }

    async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        let backend = self.enter(Op::Products, format!("{filter:?}"))?;
        Ok(backend
            .products
            .iter()
            .filter(|p| filter.state.as_ref().is_none_or(|s| &p.state == s))
            .filter(|p| filter.category.as_ref().is_none_or(|c| &p.category == c))
            .cloned()
            .collect())
    }

    async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.enter(Op::Product, id.as_str())?.product(id)
    }

    async fn add_to_cart(
        &self,
        session: &SessionId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<CartItem, ApiError> {
        let mut backend = self.enter(Op::AddToCart, format!("{product_id}:{quantity}"))?;
        backend.product(product_id)?;
        backend.next_id += 1;
        let id = CartItemId::new(format!("item-{}", backend.next_id));

        let items = backend.carts.entry(session.to_string()).or_default();
        if let Some(item) = items.iter_mut().find(|i| &i.product_id == product_id) {
            item.quantity += quantity;
            return Ok(item.clone());
        }

        let item = CartItem {
            id,
            product_id: product_id.clone(),
            quantity,
            user_session: session.clone(),
            user_id: None,
        };
        items.push(item.clone());
        Ok(item)
    }

    async fn cart(&self, session: &SessionId) -> Result<Vec<CartLine>, ApiError> {
        let backend = self.enter(Op::Cart, session.as_str())?;
        let items = backend.carts.get(session.as_str()).cloned().unwrap_or_default();

        items
            .into_iter()
            .map(|item| {
                let product = backend.product(&item.product_id)?;
                Ok(CartLine {
                    total_price: product.price * Decimal::from(item.quantity),
                    cart_item: item,
                    product,
                })
            })
            .collect()
    }

    async fn update_cart_quantity(
        &self,
        session: &SessionId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<(), ApiError> {
        let mut backend = self.enter(Op::UpdateCart, format!("{product_id}:{quantity}"))?;
        let items = backend.carts.entry(session.to_string()).or_default();
        if quantity <= 0 {
            let before = items.len();
            items.retain(|i| &i.product_id != product_id);
            if items.len() == before {
                return Err(ApiError::NotFound("Cart item not found".to_string()));
            }
            return Ok(());
        }

        let item = items
            .iter_mut()
            .find(|i| &i.product_id == product_id)
            .ok_or_else(|| ApiError::NotFound("Cart item not found".to_string()))?;
        item.quantity = quantity;
        Ok(())
    }

    async fn remove_from_cart(
        &self,
        session: &SessionId,
        product_id: &ProductId,
    ) -> Result<(), ApiError> {
        let mut backend = self.enter(Op::RemoveFromCart, product_id.as_str())?;
        let items = backend.carts.entry(session.to_string()).or_default();
        let before = items.len();
        items.retain(|i| &i.product_id != product_id);
        if items.len() == before {
            return Err(ApiError::NotFound("Cart item not found".to_string()));
        }
        Ok(())
    }

    async fn create_checkout_session(
        &self,
        origin_url: &str,
        session: &SessionId,
    ) -> Result<CheckoutRedirect, ApiError> {
        let mut backend = self.enter(Op::CreateCheckout, origin_url)?;
        if backend.carts.get(session.as_str()).is_none_or(Vec::is_empty) {
            return Err(ApiError::Api {
                status: 400,
                message: "Cart is empty".to_string(),
            });
        }
        backend.next_id += 1;
        let id = format!("cs_test_{}", backend.next_id);
        Ok(CheckoutRedirect {
            url: format!("https://pay.example/{id}"),
            session_id: PaymentSessionId::new(id),
        })
    }

    async fn checkout_status(&self, id: &PaymentSessionId) -> Result<PaymentSession, ApiError> {
        let mut backend = self.enter(Op::CheckoutStatus, id.as_str())?;
        let status = if backend.statuses.len() > 1 {
            backend.statuses.pop_front()
        } else {
            backend.statuses.front().cloned()
        };
        status.ok_or_else(|| ApiError::NotFound("Payment session not found".to_string()))
    }

    async fn me(&self) -> Result<User, ApiError> {
        self.enter(Op::Me, "")?
            .current_user
            .clone()
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
    }

    async fn login(&self, session_id: &str) -> Result<User, ApiError> {
        let mut backend = self.enter(Op::Login, session_id)?;
        let user = backend
            .logins
            .get(session_id)
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Invalid session ID".to_string()))?;
        backend.current_user = Some(user.clone());
        Ok(user)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.enter(Op::Logout, "")?.current_user = None;
        Ok(())
    }
}

/// Clock that returns immediately and records every requested sleep.
#[derive(Clone, Default)]
pub struct RecordingClock {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

/// Clock whose sleeps never finish; signals when one starts.
#[derive(Clone, Default)]
pub struct StalledClock {
    started: Arc<Notify>,
}

impl StalledClock {
    pub async fn wait_for_sleep(&self) {
        self.started.notified().await;
    }
}

impl Clock for StalledClock {
    async fn sleep(&self, _duration: Duration) {
        self.started.notify_one();
        std::future::pending::<()>().await;
    }
}

pub fn sample_product(id: &str, name: &str, price: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: format!("{name} from the farm"),
        price: Decimal::from(price),
        image_url: format!("https://images.example/{id}.jpg"),
        state: "punjab".to_string(),
        category: "Grains".to_string(),
        farmer_name: "Sukhdev Kaur".to_string(),
        quantity_available: 100,
        unit: "kg".to_string(),
    }
}

pub fn sample_state(name: &str) -> StateInfo {
    StateInfo {
        name: name.to_string(),
        agricultural_products: vec!["Wheat".to_string(), "Rice".to_string()],
        description: format!("Farms of {name}"),
        coordinates: Coordinates {
            x: 0.3,
            y: 0.8,
            z: 0.0,
        },
    }
}

pub fn sample_user(id: &str) -> User {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": "Asha Rao",
        "email": "asha@example.com",
    }))
    .unwrap()
}

pub fn payment(payment_status: PaymentStatus, status: CheckoutStatus) -> PaymentSession {
    PaymentSession {
        session_id: Some(PaymentSessionId::new("cs_test_1")),
        payment_status,
        status,
        amount_total: None,
        currency: Some("inr".to_string()),
    }
}
