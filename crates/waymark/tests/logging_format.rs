use std::io;
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use waymark::{
    ActionChainRunner, FakeClock, NavigationPolicy, Probe, RetryingNavigator, ScreenDescriptor,
    ScriptedDriver, Selector, Step, UiAction,
};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(Arc::clone(&self.0))
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "lock poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn json_lines(&self) -> Vec<serde_json::Value> {
        let bytes = self.0.lock().expect("lock output").clone();
        let text = String::from_utf8(bytes).expect("utf8 log output");
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).expect("json log line"))
            .collect()
    }
}

fn dashboard() -> ScreenDescriptor {
    ScreenDescriptor::builder("dashboard")
        .primary(Probe::visible(
            "Dashboard-badge-visible",
            Selector::accessibility_id("dashboard_badge"),
        ))
        .fallback(Probe::visible("Sites-button-visible", Selector::text("Sites")))
        .build()
        .expect("valid descriptor")
}

fn message(line: &serde_json::Value) -> Option<&str> {
    line.get("fields")
        .and_then(|f| f.get("message"))
        .and_then(|v| v.as_str())
}

#[test]
fn navigation_logs_one_json_line_per_attempt() {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .json()
        .with_max_level(Level::INFO)
        .finish();

    let driver = ScriptedDriver::new().with_visible(Selector::text("Home"));
    let navigator =
        RetryingNavigator::with_clock(NavigationPolicy::default(), FakeClock::shared());
    tracing::subscriber::with_default(subscriber, || {
        let outcome = navigator.navigate_to(
            &driver,
            &dashboard(),
            &[UiAction::tap(Selector::text("Home"))],
        );
        assert!(!outcome.success);
    });

    let lines = sink.json_lines();
    let attempts: Vec<&serde_json::Value> = lines
        .iter()
        .filter(|l| message(l) == Some("navigation attempt"))
        .collect();
    assert_eq!(attempts.len(), 3);

    for (i, line) in attempts.iter().enumerate() {
        assert_eq!(line.get("level").and_then(|v| v.as_str()), Some("INFO"));
        let fields = line.get("fields").expect("fields object");
        assert_eq!(fields.get("screen").and_then(|v| v.as_str()), Some("dashboard"));
        assert_eq!(
            fields.get("attempt").and_then(serde_json::Value::as_u64),
            Some(i as u64 + 1)
        );
        assert_eq!(
            fields.get("backoff_ms").and_then(serde_json::Value::as_u64),
            Some(500 * (i as u64 + 1))
        );
        assert_eq!(
            fields.get("outcome").and_then(|v| v.as_str()),
            Some("not_matched")
        );
    }

    let exhausted = lines
        .iter()
        .find(|l| message(l) == Some("navigation exhausted attempts"))
        .expect("exhaustion line");
    assert_eq!(exhausted.get("level").and_then(|v| v.as_str()), Some("WARN"));
}

#[test]
fn soft_failure_logs_warning_and_critical_failure_logs_error() {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .json()
        .with_max_level(Level::INFO)
        .finish();

    let driver = ScriptedDriver::new();
    let navigator =
        RetryingNavigator::with_clock(NavigationPolicy::default(), FakeClock::shared());
    let runner = ActionChainRunner::with_navigator(&driver, navigator);
    let steps = vec![
        Step::assert(Probe::visible("soft", Selector::id("a")), true).soft(),
        Step::assert(Probe::visible("hard", Selector::id("b")), true),
    ];
    tracing::subscriber::with_default(subscriber, || {
        let result = runner.run_steps("levels", &steps);
        assert!(!result.passed());
    });

    let lines = sink.json_lines();
    let level_of = |msg: &str| {
        lines
            .iter()
            .find(|l| message(l) == Some(msg))
            .and_then(|l| l.get("level"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    assert_eq!(level_of("step failed softly").as_deref(), Some("WARN"));
    assert_eq!(level_of("critical step failed").as_deref(), Some("ERROR"));
    assert_eq!(level_of("chain finished").as_deref(), Some("INFO"));
}
