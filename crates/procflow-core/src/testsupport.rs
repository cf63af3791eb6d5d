//! Shared helpers for unit tests.

use procflow_store::Store;

use crate::allocation::{AllocationInput, CardType, PackagingType, PaymentMethod};
use crate::request::{self, model::LineItem, model::PurchaseRequest};

pub fn line_item(sku_id: &str, quantity: u32) -> LineItem {
    LineItem {
        sku_id: sku_id.to_string(),
        product_name: format!("Product {sku_id}"),
        quantity,
        unit_price: 2.5,
    }
}

/// Submit a request and run it through both approval gates.
pub fn approved_request(store: &Store, line_items: Vec<LineItem>) -> PurchaseRequest {
    let req = request::create_request(store, "alice", line_items).unwrap();
    request::approve_first(store, &req.id).unwrap();
    request::approve_final(store, &req.id).unwrap()
}

pub fn default_allocation_input() -> AllocationInput {
    AllocationInput {
        packaging: PackagingType::External,
        payment_method: PaymentMethod::WireTransfer,
        prepayment_amount: 5000.0,
        card_type: Some(CardType::ColorCard),
        needs_accessories: true,
        production_date: None,
        delivery_date: None,
    }
}

/// Approve + allocate in one step; returns the request.
pub fn allocated_request(store: &Store, line_items: Vec<LineItem>) -> PurchaseRequest {
    let req = approved_request(store, line_items);
    crate::allocation::allocate(store, &req.id, default_allocation_input()).unwrap();
    request::get_request(store, &req.id).unwrap()
}
