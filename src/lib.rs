pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod state;

pub mod models {
    pub mod principal;
    pub mod query;
    pub mod saved_query;
}

pub mod services {
    pub mod auth;
    pub mod engine;
    pub mod normalize;
    pub mod token;
}

pub mod handlers {
    pub mod auth;
    pub mod health;
    pub mod queries;
    pub mod query;
}

pub mod middleware_layer {
    pub mod auth;
}

pub mod mcp {
    pub mod handlers;
    pub mod protocol;
    pub mod server;
    pub mod session;
    pub mod tools;
}
