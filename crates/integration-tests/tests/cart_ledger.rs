//! Integration tests for the cart ledger.
//!
//! These tests require a `PostgreSQL` database in `TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p bookstore-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use bookstore_core::{CartOwner, Price, ProductId, Quantity};
use bookstore_integration_tests::{TestContext, session_owner};
use bookstore_storefront::db::{CartRepository, RepositoryError};

fn qty(n: i32) -> Quantity {
    Quantity::new(n).unwrap()
}

// ============================================================================
// Add
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_add_creates_then_increments() {
    let ctx = TestContext::new().await;
    let cart = CartRepository::new(&ctx.pool);
    let owner = session_owner();
    let book = ctx.product("Middlemarch", 1099, 50).await;

    assert_eq!(cart.add_item(&owner, book, 2).await.unwrap(), qty(2));
    assert_eq!(cart.add_item(&owner, book, 3).await.unwrap(), qty(5));
    assert_eq!(ctx.line_rows(&owner, book).await, 1);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_add_clamps_to_stock() {
    let ctx = TestContext::new().await;
    let cart = CartRepository::new(&ctx.pool);
    let owner = session_owner();
    let book = ctx.product("Moby Dick", 1200, 3).await;

    assert_eq!(cart.add_item(&owner, book, 5).await.unwrap(), qty(3));
    // Already at stock: adding more leaves the line at stock.
    assert_eq!(cart.add_item(&owner, book, 1).await.unwrap(), qty(3));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_add_clamps_to_line_limit() {
    let ctx = TestContext::new().await;
    let cart = CartRepository::new(&ctx.pool);
    let owner = session_owner();
    let book = ctx.product("Ulysses", 1500, 500).await;

    assert_eq!(cart.add_item(&owner, book, 150).await.unwrap(), Quantity::MAX);
    assert_eq!(cart.add_item(&owner, book, 1).await.unwrap(), Quantity::MAX);
    assert_eq!(
        cart.add_item(&owner, book, i32::MAX).await.unwrap(),
        Quantity::MAX
    );
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_two_adds_of_fifty_stop_at_line_limit() {
    let ctx = TestContext::new().await;
    let cart = CartRepository::new(&ctx.pool);
    let owner = session_owner();
    let book = ctx.product("Don Quixote", 1800, 500).await;

    assert_eq!(cart.add_item(&owner, book, 50).await.unwrap(), qty(50));
    assert_eq!(cart.add_item(&owner, book, 50).await.unwrap(), Quantity::MAX);
    assert_eq!(cart.item_count(&owner).await.unwrap(), 99);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_add_rejects_bad_input() {
    let ctx = TestContext::new().await;
    let cart = CartRepository::new(&ctx.pool);
    let owner = session_owner();
    let book = ctx.product("Emma", 800, 10).await;
    let sold_out = ctx.product("Persuasion", 800, 0).await;

    assert!(matches!(
        cart.add_item(&owner, book, 0).await,
        Err(RepositoryError::InvalidArgument(_))
    ));
    assert!(matches!(
        cart.add_item(&owner, book, -4).await,
        Err(RepositoryError::InvalidArgument(_))
    ));
    assert!(matches!(
        cart.add_item(&owner, ProductId::new(i32::MAX), 1).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        cart.add_item(&owner, sold_out, 1).await,
        Err(RepositoryError::OutOfStock(id)) if id == sold_out
    ));
    assert!(cart.get_items(&owner).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_concurrent_adds_never_duplicate_lines() {
    let ctx = TestContext::new().await;
    let owner = session_owner();
    let book = ctx.product("War and Peace", 2000, 90).await;

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let pool = ctx.pool.clone();
        let owner = owner.clone();
        tasks.push(tokio::spawn(async move {
            CartRepository::new(&pool).add_item(&owner, book, 2).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(ctx.line_rows(&owner, book).await, 1);
    let items = CartRepository::new(&ctx.pool).get_items(&owner).await.unwrap();
    assert_eq!(items.lines[0].quantity, qty(32));
}

// ============================================================================
// Update / Remove
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_update_sets_absolute_quantity() {
    let ctx = TestContext::new().await;
    let cart = CartRepository::new(&ctx.pool);
    let owner = session_owner();
    let book = ctx.product("Dracula", 650, 8).await;

    // Creates the line when absent.
    assert_eq!(cart.update_quantity(&owner, book, 4).await.unwrap(), qty(4));
    assert_eq!(cart.update_quantity(&owner, book, 2).await.unwrap(), qty(2));
    assert_eq!(cart.update_quantity(&owner, book, 20).await.unwrap(), qty(8));
    assert!(matches!(
        cart.update_quantity(&owner, book, 0).await,
        Err(RepositoryError::InvalidArgument(_))
    ));
    assert_eq!(ctx.line_rows(&owner, book).await, 1);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_stock_drop_is_applied_on_next_write() {
    let ctx = TestContext::new().await;
    let cart = CartRepository::new(&ctx.pool);
    let owner = session_owner();
    let book = ctx.product("Walden", 900, 10).await;

    cart.add_item(&owner, book, 9).await.unwrap();
    ctx.set_stock(book, 4).await;
    assert_eq!(cart.add_item(&owner, book, 1).await.unwrap(), qty(4));

    ctx.set_stock(book, 0).await;
    assert!(matches!(
        cart.update_quantity(&owner, book, 1).await,
        Err(RepositoryError::OutOfStock(_))
    ));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_remove_is_idempotent() {
    let ctx = TestContext::new().await;
    let cart = CartRepository::new(&ctx.pool);
    let owner = session_owner();
    let book = ctx.product("Candide", 400, 5).await;

    cart.add_item(&owner, book, 1).await.unwrap();
    assert!(cart.remove_item(&owner, book).await.unwrap());
    assert!(!cart.remove_item(&owner, book).await.unwrap());
    assert!(!cart.remove_item(&session_owner(), book).await.unwrap());
    assert_eq!(ctx.line_rows(&owner, book).await, 0);
}

// ============================================================================
// Read / Clear
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_cart_lines_and_total() {
    let ctx = TestContext::new().await;
    let cart = CartRepository::new(&ctx.pool);
    let owner = session_owner();
    let zeta = ctx.product("Zeta Stories", 1999, 10).await;
    let alpha = ctx.product("Alpha Poems", 333, 10).await;

    cart.add_item(&owner, zeta, 2).await.unwrap();
    cart.add_item(&owner, alpha, 3).await.unwrap();

    let items = cart.get_items(&owner).await.unwrap();
    let names: Vec<&str> = items.lines.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["Alpha Poems", "Zeta Stories"]);
    assert_eq!(items.lines[0].subtotal, Price::from_cents(999));
    assert_eq!(items.lines[1].subtotal, Price::from_cents(3998));
    assert_eq!(items.total, Price::from_cents(999 + 3998));
    assert_eq!(cart.item_count(&owner).await.unwrap(), 5);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_owners_are_isolated() {
    let ctx = TestContext::new().await;
    let cart = CartRepository::new(&ctx.pool);
    let user = CartOwner::User(ctx.user().await);
    let visitor = session_owner();
    let book = ctx.product("Beowulf", 500, 10).await;

    cart.add_item(&user, book, 1).await.unwrap();
    cart.add_item(&visitor, book, 4).await.unwrap();

    assert_eq!(cart.item_count(&user).await.unwrap(), 1);
    assert_eq!(cart.item_count(&visitor).await.unwrap(), 4);

    assert_eq!(cart.clear(&visitor).await.unwrap(), 1);
    assert_eq!(cart.item_count(&visitor).await.unwrap(), 0);
    assert_eq!(cart.item_count(&user).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_empty_cart_reads() {
    let ctx = TestContext::new().await;
    let cart = CartRepository::new(&ctx.pool);
    let owner = session_owner();

    let items = cart.get_items(&owner).await.unwrap();
    assert!(items.is_empty());
    assert_eq!(items.total, Price::ZERO);
    assert_eq!(cart.item_count(&owner).await.unwrap(), 0);
    assert_eq!(cart.clear(&owner).await.unwrap(), 0);
}

// ============================================================================
// Merge
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_merge_folds_session_into_user() {
    let ctx = TestContext::new().await;
    let cart = CartRepository::new(&ctx.pool);
    let user_id = ctx.user().await;
    let user = CartOwner::User(user_id);
    let visitor = session_owner();
    let CartOwner::Session(session_id) = &visitor else {
        unreachable!()
    };

    let shared = ctx.product("Hamlet", 700, 4).await;
    let session_only = ctx.product("Macbeth", 700, 10).await;
    let user_only = ctx.product("Othello", 700, 10).await;
    let sold_out = ctx.product("Lear", 700, 5).await;

    cart.add_item(&user, shared, 3).await.unwrap();
    cart.add_item(&user, user_only, 1).await.unwrap();
    cart.add_item(&visitor, shared, 2).await.unwrap();
    cart.add_item(&visitor, session_only, 5).await.unwrap();
    cart.add_item(&visitor, sold_out, 2).await.unwrap();
    ctx.set_stock(sold_out, 0).await;

    let outcome = cart.merge(session_id, user_id).await.unwrap();
    assert_eq!(outcome.merged_lines, 2);
    assert_eq!(outcome.dropped_lines, 1);

    let items = cart.get_items(&user).await.unwrap();
    let quantity_of = |id: ProductId| {
        items
            .lines
            .iter()
            .find(|l| l.product_id == id)
            .map(|l| l.quantity.get())
    };
    // 3 + 2 clamped to a stock of 4.
    assert_eq!(quantity_of(shared), Some(4));
    assert_eq!(quantity_of(session_only), Some(5));
    assert_eq!(quantity_of(user_only), Some(1));
    assert_eq!(quantity_of(sold_out), None);

    assert!(cart.get_items(&visitor).await.unwrap().is_empty());
    assert_eq!(ctx.line_rows(&user, shared).await, 1);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_merge_of_empty_session_is_a_no_op() {
    let ctx = TestContext::new().await;
    let cart = CartRepository::new(&ctx.pool);
    let user_id = ctx.user().await;
    let user = CartOwner::User(user_id);
    let book = ctx.product("Odyssey", 1100, 10).await;
    cart.add_item(&user, book, 2).await.unwrap();

    let CartOwner::Session(session_id) = session_owner() else {
        unreachable!()
    };
    let outcome = cart.merge(&session_id, user_id).await.unwrap();

    assert_eq!(outcome.merged_lines, 0);
    assert_eq!(outcome.dropped_lines, 0);
    assert_eq!(cart.item_count(&user).await.unwrap(), 2);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_merge_respects_line_limit() {
    let ctx = TestContext::new().await;
    let cart = CartRepository::new(&ctx.pool);
    let user_id = ctx.user().await;
    let user = CartOwner::User(user_id);
    let visitor = session_owner();
    let CartOwner::Session(session_id) = &visitor else {
        unreachable!()
    };
    let book = ctx.product("Iliad", 1100, 1000).await;

    cart.add_item(&user, book, 60).await.unwrap();
    cart.add_item(&visitor, book, 60).await.unwrap();
    cart.merge(session_id, user_id).await.unwrap();

    assert_eq!(cart.item_count(&user).await.unwrap(), 99);
}
