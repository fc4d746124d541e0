use authgate::logging::init_tracing;
use authgate::router::init_router;
use authgate::state::init_app_state;
use dotenvy::dotenv;

#[tokio::main]
async fn main() {
    dotenv().ok();

    init_tracing();

    let state = init_app_state().await;
    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:4000").await.unwrap();
    println!("🚀 Server running on http://localhost:4000");
    println!("📚 Swagger UI available at http://localhost:4000/swagger-ui");
    println!("📖 Scalar UI available at http://localhost:4000/scalar");
    axum::serve(listener, app).await.unwrap();
}
