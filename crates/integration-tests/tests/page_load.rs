//! Full page loads: auth bootstrap, routing, and payment return.

use agrimap_core::{CheckoutStatus, PaymentStatus};
use agrimap_integration_tests::{FakeBackend, test_user};
use agrimap_storefront::payment::PaymentState;
use agrimap_storefront::{PageState, Storefront};

async fn setup() -> (FakeBackend, Storefront) {
    let backend = FakeBackend::start().await.expect("start fake backend");
    let storefront = backend.storefront().expect("build storefront");
    (backend, storefront)
}

#[tokio::test]
async fn test_shop_page() {
    let (backend, storefront) = setup().await;

    let load = storefront.load(&backend.page("/")).await;

    assert_eq!(load.page, PageState::Shop);
    assert!(load.user.is_none());
    assert!(load.session.session_id.as_str().starts_with("session_"));
}

#[tokio::test]
async fn test_each_load_gets_a_new_session() {
    let (backend, storefront) = setup().await;

    let first = storefront.load(&backend.page("/")).await;
    let second = storefront.load(&backend.page("/")).await;

    assert_ne!(first.session.session_id, second.session.session_id);
}

#[tokio::test]
async fn test_profile_requires_user() {
    let (backend, storefront) = setup().await;

    let load = storefront.load(&backend.page("/profile")).await;

    assert_eq!(load.page, PageState::Redirect("/"));
}

#[tokio::test]
async fn test_profile_after_fragment_login() {
    let (backend, storefront) = setup().await;
    let user = test_user("u-7", "Meera Iyer", "meera@example.com");
    backend.accept_login("abc123", user.clone());

    let load = storefront
        .load(&backend.page("/profile#session_id=abc123"))
        .await;

    assert_eq!(load.page, PageState::Profile(user));
    assert_eq!(load.url.as_str(), "https://mapfresh.test/profile");
}

#[tokio::test]
async fn test_payment_return_polls_until_paid() {
    let (backend, storefront) = setup().await;
    let session = storefront.new_session();
    let rice = backend.product_id("Premium Basmati Rice").expect("seeded product");
    storefront.cart(&session).add(&rice, 2).await.expect("add");
    let redirect = storefront
        .checkout()
        .create_session(&session)
        .await
        .expect("checkout");
    backend.script_statuses(&[
        (PaymentStatus::Unpaid, CheckoutStatus::Open),
        (PaymentStatus::Paid, CheckoutStatus::Complete),
    ]);

    let path = format!("/success?session_id={}", redirect.session_id);
    let load = storefront.load(&backend.page(&path)).await;

    let PageState::Payment(PaymentState::Success(paid)) = load.page else {
        panic!("expected a paid session, got {:?}", load.page);
    };
    assert_eq!(paid.amount_total, Some(rust_decimal::Decimal::from(240)));
    assert_eq!(backend.hits("checkout_status"), 2);
}

#[tokio::test]
async fn test_payment_return_without_id() {
    let (backend, storefront) = setup().await;

    let load = storefront.load(&backend.page("/success")).await;

    assert_eq!(load.page, PageState::Payment(PaymentState::Error));
    assert_eq!(backend.hits("checkout_status"), 0);
}

#[tokio::test]
async fn test_cancelled_and_unknown_pages() {
    let (backend, storefront) = setup().await;

    let cancelled = storefront.load(&backend.page("/cancel")).await;
    let unknown = storefront.load(&backend.page("/nowhere")).await;

    assert_eq!(cancelled.page, PageState::Cancelled);
    assert_eq!(unknown.page, PageState::Redirect("/"));
}
