use rocket::{
    fairing::{Fairing, Info, Kind},
    http::Status,
    Data, Request, Response,
};
use std::time::Instant;
use tracing::{info, warn};

pub struct RequestTimer;

#[derive(Clone, Copy)]
struct TimerStart(Option<Instant>);

#[rocket::async_trait]
impl Fairing for RequestTimer {
    fn info(&self) -> Info {
        Info {
            name: "Request timer",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        if request.uri().path().as_str() == "/" {
            return;
        }
        request.local_cache(|| TimerStart(Some(Instant::now())));
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let started = match request.local_cache(|| TimerStart(None)).0 {
            Some(started) => started,
            None => return,
        };
        let method = request.method().as_str();
        let path = request.uri().path();
        let status = response.status();
        let elapsed = started.elapsed();

        if status == Status::Ok || status == Status::NoContent {
            info!("{} {} {} in {:?}", method, path, status.code, elapsed);
        } else {
            let kind = if status.code >= 500 {
                "Internal error"
            } else {
                "Bad input error"
            };
            warn!("{} {} {} ({}) in {:?}", method, path, status.code, kind, elapsed);
        }
    }
}
