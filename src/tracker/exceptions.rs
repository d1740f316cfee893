use super::client::HttpTrackerClient;
use crate::domain::value::ArgValue;
use crate::record::{normalize, NotificationBuilder};
use std::collections::BTreeMap;
use std::panic::PanicHookInfo;
use tracing::error;

/// Install a process-wide panic hook that reports uncaught panics to the
/// tracker. The previously installed hook is chained, not replaced.
pub(crate) fn install_panic_hook(client: HttpTrackerClient) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        report_panic(&client, panic_info);
        previous(panic_info);
    }));
}

fn report_panic(client: &HttpTrackerClient, panic_info: &PanicHookInfo<'_>) {
    let message = panic_info
        .payload()
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| {
            panic_info
                .payload()
                .downcast_ref::<String>()
                .map(|s| s.as_str())
        })
        .unwrap_or("unknown panic payload");

    let mut args: Vec<ArgValue> = vec![message.into()];
    if let Some(location) = panic_info.location() {
        let mut fields = BTreeMap::new();
        fields.insert("file".to_string(), location.file().into());
        fields.insert("line".to_string(), ArgValue::from(u64::from(location.line())));
        fields.insert(
            "column".to_string(),
            ArgValue::from(u64::from(location.column())),
        );
        args.push(ArgValue::Map(fields));
    }

    match NotificationBuilder::new("panic", "error")
        .build(normalize(args), client.stack_trace_limit())
    {
        Ok(notification) => client.submit_panic_notification(notification),
        Err(e) => error!("failed to build panic notification: {e}"),
    }
}
