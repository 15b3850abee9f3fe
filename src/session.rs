use std::sync::Arc;

use chrono::TimeZone;

use crate::api::{ClientError, ClockApi};
use crate::clock::{Clock, ClockEditor, SubmitError};
use crate::task::{TaskHandle, TaskScope};

/// Remote work started from one editor or listing view.
///
/// The clock API is injected; nothing here reaches for a shared client.
/// Closing or dropping the session cancels whatever is still in flight and
/// throws its results away.
pub struct Session {
    api: Arc<dyn ClockApi>,
    scope: TaskScope,
}

impl Session {
    pub fn new(api: Arc<dyn ClockApi>) -> Self {
        Self {
            api,
            scope: TaskScope::new(),
        }
    }

    pub fn load_clocks(&self) -> TaskHandle<Option<Vec<Clock>>> {
        let api = Arc::clone(&self.api);
        self.scope.spawn(move || api.list_clocks())
    }

    /// Sends the editor's clock to the service. Refused while the editor
    /// shows an error or holds an already stored clock.
    pub fn submit<Tz: TimeZone>(
        &self,
        editor: &ClockEditor<Tz>,
    ) -> Result<TaskHandle<Result<(), ClientError>>, SubmitError> {
        let clock = editor.submission()?.clone();
        let api = Arc::clone(&self.api);
        Ok(self.scope.spawn(move || api.create_clock(&clock)))
    }

    pub fn cancel(&self) {
        self.scope.cancel();
    }

    pub fn close(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::{self, Receiver};
    use std::sync::{Mutex, PoisonError};

    use chrono::{Utc, offset::FixedOffset};

    use super::*;
    use crate::clock::FormField;

    #[derive(Default)]
    struct FakeApi {
        clocks: Vec<Clock>,
        created: Mutex<Vec<Clock>>,
        gate: Option<Mutex<Receiver<()>>>,
    }

    impl FakeApi {
        fn wait_for_gate(&self) {
            if let Some(gate) = &self.gate {
                let _ = gate.lock().unwrap_or_else(PoisonError::into_inner).recv();
            }
        }
    }

    impl ClockApi for FakeApi {
        fn list_clocks(&self) -> Option<Vec<Clock>> {
            self.wait_for_gate();
            Some(self.clocks.clone())
        }

        fn create_clock(&self, clock: &Clock) -> Result<(), ClientError> {
            self.wait_for_gate();
            self.created
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(clock.clone());
            Ok(())
        }
    }

    fn utc_plus_two() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).expect("valid offset")
    }

    #[test]
    fn submit_creates_the_previewed_clock() {
        let api = Arc::new(FakeApi::default());
        let session = Session::new(api.clone());
        let mut editor = ClockEditor::new(utc_plus_two(), None, Utc::now());
        editor.set_field(FormField::Name, "release");
        editor.set_field(FormField::EndDate, "2027-01-15");
        editor.set_field(FormField::EndTime, "12:00");

        let outcome = session.submit(&editor).expect("valid form").wait();
        assert!(matches!(outcome, Some(Ok(()))));

        let created = api.created.lock().expect("created").clone();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "release");
        assert_eq!(
            created[0].end.map(|end| end.to_rfc3339()),
            Some("2027-01-15T10:00:00+00:00".to_string())
        );
    }

    #[test]
    fn submit_refuses_invalid_form() {
        let api = Arc::new(FakeApi::default());
        let session = Session::new(api.clone());
        let editor = ClockEditor::new(utc_plus_two(), None, Utc::now());

        let err = session.submit(&editor).expect_err("no end date");
        assert_eq!(
            err.to_string(),
            "If clock counts down, an end date is needed."
        );
        assert!(api.created.lock().expect("created").is_empty());
    }

    #[test]
    fn load_clocks_returns_listing() {
        let clock = Clock::counting_up("uptime", Utc::now());
        let api = Arc::new(FakeApi {
            clocks: vec![clock.clone()],
            ..FakeApi::default()
        });
        let session = Session::new(api);
        assert_eq!(session.load_clocks().wait(), Some(Some(vec![clock])));
    }

    #[test]
    fn cancelled_session_discards_listing() {
        let (release, gate) = mpsc::channel();
        let api = Arc::new(FakeApi {
            clocks: vec![Clock::counting_up("uptime", Utc::now())],
            gate: Some(Mutex::new(gate)),
            ..FakeApi::default()
        });
        let session = Session::new(api);
        let pending = session.load_clocks();

        session.cancel();
        release.send(()).expect("release listing");
        assert_eq!(pending.wait(), None);
        session.close();
    }
}
