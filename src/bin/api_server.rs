use std::net::SocketAddr;

use log::{error, info};
use structopt::StructOpt;
use utmkit::api::create_router_with_cache;
use utmkit::cache::ZoneCache;

/// HTTP server for UTM coordinate conversion
#[derive(Debug, StructOpt)]
#[structopt(name = "api-server")]
struct Opt {
    /// Address to listen on
    #[structopt(long, default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Number of zone converters kept in memory
    #[structopt(long, default_value = "128")]
    cache_size: usize,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let opt = Opt::from_args();

    let app = create_router_with_cache(ZoneCache::new(opt.cache_size));

    let listener = match tokio::net::TcpListener::bind(opt.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {}: {}", opt.bind, e);
            std::process::exit(1);
        }
    };

    info!("listening on http://{}", opt.bind);
    println!("UTM Converter API Server");
    println!("Listening on http://{}", opt.bind);
    println!();
    println!("Endpoints:");
    println!("  GET  /api/utm?latitude=<deg>&longitude=<deg>[&datum=NAD27]");
    println!("  GET  /api/geodetic?zone=<n>&hemisphere=<N|S>&easting=<m>&northing=<m>[&datum=NAD27]");
    println!("  POST /api/batch (multipart/form-data: csv file [+ datum, direction])");
    println!();

    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {}", e);
        std::process::exit(1);
    }
}
