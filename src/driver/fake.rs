//! Scripted in-memory driver used by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::AccountConfig;
use crate::driver::session::Session;
use crate::driver::traits::{DriverError, DriverResult, Locator, SessionDriver};

/// One scripted response for an element wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Condition holds (present / clickable / invisible).
    Ok,
    /// Element absent.
    NotFound,
    /// Bounded wait expired with the condition still false.
    Timeout,
}

#[derive(Debug)]
struct Seq {
    steps: VecDeque<Step>,
    fallback: Step,
}

impl Seq {
    fn next(&mut self) -> Step {
        self.steps.pop_front().unwrap_or(self.fallback)
    }
}

#[derive(Default)]
struct ScriptTable(HashMap<String, Seq>);

impl ScriptTable {
    fn set(&mut self, selector: &str, steps: &[Step], fallback: Step) {
        self.0.insert(
            selector.to_string(),
            Seq {
                steps: steps.iter().copied().collect(),
                fallback,
            },
        );
    }

    /// Unscripted selectors behave as if the condition holds immediately.
    fn next(&mut self, selector: &str) -> Step {
        match self.0.get_mut(selector) {
            Some(seq) => seq.next(),
            None => Step::Ok,
        }
    }
}

pub(crate) struct FakeDriver {
    find: Mutex<ScriptTable>,
    clickable: Mutex<ScriptTable>,
    invisible: Mutex<ScriptTable>,
    fail_open: AtomicBool,
    pub(crate) clicks: Mutex<Vec<String>>,
    pub(crate) close_count: Arc<AtomicUsize>,
}

impl FakeDriver {
    pub(crate) fn new() -> Self {
        Self {
            find: Mutex::new(ScriptTable::default()),
            clickable: Mutex::new(ScriptTable::default()),
            invisible: Mutex::new(ScriptTable::default()),
            fail_open: AtomicBool::new(false),
            clicks: Mutex::new(Vec::new()),
            close_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn script_find(&self, selector: &str, steps: &[Step], fallback: Step) {
        self.find.lock().unwrap().set(selector, steps, fallback);
    }

    pub(crate) fn script_clickable(&self, selector: &str, steps: &[Step], fallback: Step) {
        self.clickable.lock().unwrap().set(selector, steps, fallback);
    }

    pub(crate) fn script_invisible(&self, selector: &str, steps: &[Step], fallback: Step) {
        self.invisible.lock().unwrap().set(selector, steps, fallback);
    }

    pub(crate) fn fail_open(&self) {
        self.fail_open.store(true, Ordering::SeqCst);
    }

    pub(crate) fn clicks_on(&self, selector: &str) -> usize {
        self.clicks
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.as_str() == selector)
            .count()
    }

    pub(crate) fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.close_count)
    }
}

#[async_trait]
impl SessionDriver for FakeDriver {
    async fn open(&self, _url: &str) -> DriverResult<()> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(DriverError::Backend("navigation refused".into()));
        }
        Ok(())
    }

    async fn find(&self, locator: &Locator, _timeout: Duration) -> DriverResult<()> {
        match self.find.lock().unwrap().next(locator.selector()) {
            Step::Ok => Ok(()),
            Step::NotFound | Step::Timeout => {
                Err(DriverError::NotFound(locator.selector().into()))
            }
        }
    }

    async fn wait_clickable(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
        match self.clickable.lock().unwrap().next(locator.selector()) {
            Step::Ok => Ok(()),
            Step::NotFound => Err(DriverError::NotFound(locator.selector().into())),
            Step::Timeout => Err(DriverError::Timeout {
                locator: locator.selector().into(),
                timeout,
            }),
        }
    }

    async fn click(&self, locator: &Locator) -> DriverResult<()> {
        self.clicks.lock().unwrap().push(locator.selector().into());
        Ok(())
    }

    async fn wait_invisible(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
        match self.invisible.lock().unwrap().next(locator.selector()) {
            // An absent element counts as invisible.
            Step::Ok | Step::NotFound => Ok(()),
            Step::Timeout => Err(DriverError::Timeout {
                locator: locator.selector().into(),
                timeout,
            }),
        }
    }

    async fn close(&self) -> DriverResult<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Session wrapping a fake driver, returning the shared close counter so
/// tests can assert close-exactly-once after the session has been consumed.
pub(crate) fn fake_session(id: &str, driver: FakeDriver) -> (Session, Arc<AtomicUsize>) {
    let counter = driver.close_counter();
    let session = Session::new(id, AccountConfig::default(), Box::new(driver));
    (session, counter)
}
