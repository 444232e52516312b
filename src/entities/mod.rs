pub mod customer;
pub mod order;
pub mod order_material;
pub mod outsource_order;
pub mod product;
pub mod schedule;
