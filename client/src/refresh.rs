use futures::{Stream, StreamExt};
use gloo_timers::future::IntervalStream;
use wasm_bindgen_futures::spawn_local;

use crate::dashboard::Dashboard;
use crate::ports::{MapSurface, Presentation, TrafficApi};

/// Re-pull incidents every `period_ms` for as long as the page lives.
/// Each tick gets its own task so a slow fetch never delays the next one.
pub fn start<A, M, P>(dashboard: Dashboard<A, M, P>, period_ms: u32)
where
    A: TrafficApi + 'static,
    M: MapSurface + 'static,
    P: Presentation + 'static,
{
    tracing::info!(period_ms, "starting incident refresh loop");
    spawn_local(drive(IntervalStream::new(period_ms), move || {
        let dashboard = dashboard.clone();
        spawn_local(async move { dashboard.refresh_tick().await });
    }));
}

/// Call `on_tick` once per item until `ticks` ends.
pub async fn drive<S, F>(ticks: S, mut on_tick: F)
where
    S: Stream,
    F: FnMut(),
{
    let mut ticks = std::pin::pin!(ticks);
    while ticks.next().await.is_some() {
        on_tick();
    }
}
