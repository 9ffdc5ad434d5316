pub mod health_routes;
pub mod render_routes;
