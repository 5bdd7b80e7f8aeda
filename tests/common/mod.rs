//! Shared code for our test harness.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};
use lazy_static::lazy_static;
use stream_manifest::{ParseWarning, ParserOptions};


lazy_static! {
    static ref TRACING_INIT: Once = Once::new();
}

pub fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, fmt::time::LocalTime, prelude::*};
    use time::macros::format_description;

    TRACING_INIT.call_once(|| {
        let timer = LocalTime::new(format_description!("[hour]:[minute]:[second]"));
        let fmt_layer = fmt::layer()
            .compact()
            .with_timer(timer)
            .with_target(false);
        let filter_layer = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("info,stream_manifest=warn"))
            .expect("initializing logging");
        // another test may already have installed a global subscriber
        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    });
}


/// Records the warnings delivered to the warn callback of a parser.
#[derive(Clone, Default)]
pub struct WarningCollector {
    seen: Arc<Mutex<Vec<ParseWarning>>>,
}

impl WarningCollector {
    pub fn new() -> WarningCollector {
        WarningCollector::default()
    }

    /// Parser options that report to this collector.
    pub fn options(&self) -> ParserOptions {
        self.attach(ParserOptions::new())
    }

    pub fn attach(&self, options: ParserOptions) -> ParserOptions {
        let seen = Arc::clone(&self.seen);
        options.with_warn_callback(move |w| seen.lock().unwrap().push(w.clone()))
    }

    pub fn warnings(&self) -> Vec<ParseWarning> {
        self.seen.lock().unwrap().clone()
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.seen.lock().unwrap().iter().map(|w| w.code()).collect()
    }

    pub fn count(&self, code: &str) -> usize {
        self.codes().iter().filter(|c| **c == code).count()
    }

    pub fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }
}
