//! Shared test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ziggy::capabilities::{
    DeviceCommand, DeviceControl, EventTrigger, FileStore, KnowledgeSource, TaskStore,
};
use ziggy::intent::{Classifier, CompletionBackend, SemanticClassifier};
use ziggy::memory::InMemoryPersistence;
use ziggy::{
    Capabilities, CommandRouter, Dispatcher, Error, IntentResolver, LifecycleGate, MemoryStore,
    ResolvedIntent, Result,
};

/// Device controller that records every command
#[derive(Default)]
pub struct MockDevices {
    pub calls: Mutex<Vec<(String, DeviceCommand)>>,
    pub known: Vec<String>,
}

impl MockDevices {
    pub fn with_devices(names: &[&str]) -> Self {
        Self {
            calls: Mutex::default(),
            known: names.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn calls(&self) -> Vec<(String, DeviceCommand)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceControl for MockDevices {
    async fn control(&self, device: &str, command: DeviceCommand) -> Result<()> {
        if !self.known.is_empty() && !self.known.iter().any(|d| d == device) {
            return Err(Error::NotFound(format!("device '{device}'")));
        }
        self.calls.lock().unwrap().push((device.to_string(), command));
        Ok(())
    }
}

/// File store backed by an in-memory list and map
#[derive(Default)]
pub struct MockFiles {
    pub list: Mutex<Vec<String>>,
    pub files: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl FileStore for MockFiles {
    async fn add_to_list(&self, item: &str) -> Result<()> {
        self.list.lock().unwrap().push(item.to_string());
        Ok(())
    }

    async fn remove_from_list(&self, item: &str) -> Result<()> {
        let mut list = self.list.lock().unwrap();
        let Some(pos) = list.iter().position(|i| i == item) else {
            return Err(Error::NotFound(format!("'{item}' is not on the list")));
        };
        list.remove(pos);
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<String> {
        if name.contains('/') {
            return Err(Error::InvalidInput(format!("bad name {name}")));
        }
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.clone())
            .ok_or_else(|| Error::NotFound(format!("file '{name}'")))
    }

    async fn write(&self, name: &str, content: &str) -> Result<()> {
        if name.contains('/') {
            return Err(Error::InvalidInput(format!("bad name {name}")));
        }
        let mut files = self.files.lock().unwrap();
        files.retain(|(n, _)| n != name);
        files.push((name.to_string(), content.to_string()));
        Ok(())
    }
}

/// Task store that records created and cancelled tasks
#[derive(Default)]
pub struct MockTasks {
    pub created: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl TaskStore for MockTasks {
    async fn create_task(&self, description: &str, when: &str) -> Result<()> {
        self.created
            .lock()
            .unwrap()
            .push((description.to_string(), when.to_string()));
        Ok(())
    }

    async fn cancel_task(&self, description: &str) -> Result<()> {
        let mut created = self.created.lock().unwrap();
        let before = created.len();
        created.retain(|(d, _)| d != description);
        if created.len() == before {
            return Err(Error::NotFound(format!("task '{description}'")));
        }
        Ok(())
    }
}

/// Event trigger that can be told to fail
#[derive(Default)]
pub struct MockEvents {
    pub fired: Mutex<Vec<(String, Option<String>)>>,
    pub fail: bool,
}

#[async_trait]
impl EventTrigger for MockEvents {
    async fn trigger(&self, event: &str, value: Option<&str>) -> Result<()> {
        if self.fail {
            return Err(Error::Integration("webhook rejected".to_string()));
        }
        self.fired
            .lock()
            .unwrap()
            .push((event.to_string(), value.map(ToString::to_string)));
        Ok(())
    }
}

/// Knowledge source with a canned answer
pub struct MockKnowledge(pub String);

#[async_trait]
impl KnowledgeSource for MockKnowledge {
    async fn answer(&self, _question: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Classifier that returns a fixed resolution and counts calls
pub struct CountingClassifier {
    pub result: ResolvedIntent,
    pub calls: AtomicUsize,
}

impl CountingClassifier {
    pub fn returning(result: ResolvedIntent) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for CountingClassifier {
    async fn classify(&self, _text: &str) -> ResolvedIntent {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Completion backend with a canned raw model reply
pub struct ScriptedBackend(pub String);

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Semantic classifier over a scripted model reply
pub fn scripted_classifier(raw: &str) -> Arc<dyn Classifier> {
    Arc::new(SemanticClassifier::new(
        Arc::new(ScriptedBackend(raw.to_string())),
        "Ziggy",
        Duration::from_secs(5),
    ))
}

/// All mocks behind one dispatcher
pub struct Harness {
    pub devices: Arc<MockDevices>,
    pub files: Arc<MockFiles>,
    pub tasks: Arc<MockTasks>,
    pub events: Arc<MockEvents>,
    pub gate: Arc<LifecycleGate>,
    pub memory: Arc<MemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_gate(LifecycleGate::with_window(Duration::from_secs(30), false))
    }

    pub fn with_gate(gate: LifecycleGate) -> Self {
        Self {
            devices: Arc::new(MockDevices::with_devices(&["lamp", "heater", "מנורה"])),
            files: Arc::new(MockFiles::default()),
            tasks: Arc::new(MockTasks::default()),
            events: Arc::new(MockEvents::default()),
            gate: Arc::new(gate),
            memory: Arc::new(MemoryStore::open(Box::new(InMemoryPersistence::new()))),
        }
    }

    pub fn capabilities(&self, knowledge: Option<Arc<dyn KnowledgeSource>>) -> Capabilities {
        Capabilities {
            devices: self.devices.clone(),
            files: self.files.clone(),
            tasks: self.tasks.clone(),
            events: self.events.clone(),
            knowledge,
            lifecycle: self.gate.clone(),
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.capabilities(None), self.memory.clone())
    }

    pub fn router(&self, classifier: Arc<dyn Classifier>) -> CommandRouter {
        CommandRouter::new(IntentResolver::new(classifier), self.dispatcher())
    }
}
