//! Test helpers for service unit tests
//!
//! In-memory stand-ins for the archive, the server probe and the confirmation
//! prompt, so failover and marker logic can be tested without a network.

use async_trait::async_trait;
use ccf_api_client::{ResourceClient, ServerProbe, UploadParams};
use ccf_core::{
    ArchiveError, ArchiveResult, Credentials, ResourceLocation, UploadMode,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::prompt::Prompt;

pub const PASSWORD: &str = "secret";

/// Probe that reports a fixed set of servers healthy, optionally only after a number of calls
pub struct FakeProbe {
    healthy: HashSet<String>,
    healthy_after_calls: usize,
    calls: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn healthy(servers: &[&str]) -> Self {
        Self::healthy_after(servers, 0)
    }

    pub fn healthy_after(servers: &[&str], calls: usize) -> Self {
        Self {
            healthy: servers.iter().map(|s| s.to_string()).collect(),
            healthy_after_calls: calls,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServerProbe for FakeProbe {
    async fn is_healthy(&self, server: &str) -> bool {
        let mut calls = self.calls.lock().unwrap();
        let previous = calls.len();
        calls.push(server.to_string());
        previous >= self.healthy_after_calls && self.healthy.contains(server)
    }
}

/// Archive kept in memory, keyed by `server|sessionId|resource|path`
#[derive(Default)]
pub struct InMemoryArchive {
    sessions: HashMap<String, String>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    fail_puts: bool,
    puts: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
}

impl InMemoryArchive {
    pub fn with_session(label: &str, id: &str) -> Self {
        let mut sessions = HashMap::new();
        sessions.insert(label.to_string(), id.to_string());
        Self {
            sessions,
            ..Default::default()
        }
    }

    pub fn failing_puts(mut self) -> Self {
        self.fail_puts = true;
        self
    }

    fn key(location: &ResourceLocation, session_id: &str) -> String {
        format!(
            "{}|{}|{}|{}",
            location.server, session_id, location.resource, location.file_path
        )
    }

    /// Files of one resource as `(path within resource, bytes)`, sorted by path.
    pub fn resource_files(&self, resource: &str) -> Vec<(String, Vec<u8>)> {
        let mut out: Vec<_> = self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(key, bytes)| {
                let parts: Vec<&str> = key.splitn(4, '|').collect();
                (parts[2] == resource).then(|| (parts[3].to_string(), bytes.clone()))
            })
            .collect();
        out.sort();
        out
    }

    pub fn insert(&self, location: &ResourceLocation, session_id: &str, bytes: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(Self::key(location, session_id), bytes.to_vec());
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.lock().unwrap().len()
    }

    fn check_credentials(location: &ResourceLocation, credentials: &Credentials) -> ArchiveResult<()> {
        if credentials.password() != PASSWORD {
            return Err(ArchiveError::Auth {
                server: location.server.clone(),
                user: credentials.user.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceClient for InMemoryArchive {
    async fn resolve_session_id(
        &self,
        location: &ResourceLocation,
        credentials: &Credentials,
    ) -> ArchiveResult<String> {
        Self::check_credentials(location, credentials)?;
        self.sessions
            .get(&location.session())
            .cloned()
            .ok_or_else(|| ArchiveError::NotFound(location.session()))
    }

    async fn put_file(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
        params: UploadParams<'_>,
    ) -> ArchiveResult<()> {
        Self::check_credentials(location, credentials)?;
        if self.fail_puts {
            return Err(ArchiveError::transport(&location.server, "connection reset"));
        }
        let bytes = match params.mode {
            UploadMode::ByContent => tokio::fs::read(params.source)
                .await
                .map_err(|e| ArchiveError::io(params.source, e))?,
            UploadMode::ByReference => params.source.to_string_lossy().as_bytes().to_vec(),
        };
        let key = Self::key(location, session_id);
        self.puts.lock().unwrap().push(key.clone());
        self.files.lock().unwrap().insert(key, bytes);
        Ok(())
    }

    async fn delete_file(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
    ) -> ArchiveResult<()> {
        Self::check_credentials(location, credentials)?;
        let key = Self::key(location, session_id);
        self.deletes.lock().unwrap().push(key.clone());
        self.files
            .lock()
            .unwrap()
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| ArchiveError::NotFound(location.describe()))
    }

    async fn file_exists(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
    ) -> ArchiveResult<bool> {
        Self::check_credentials(location, credentials)?;
        Ok(self
            .files
            .lock()
            .unwrap()
            .contains_key(&Self::key(location, session_id)))
    }

    async fn read_file(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
    ) -> ArchiveResult<Vec<u8>> {
        Self::check_credentials(location, credentials)?;
        self.files
            .lock()
            .unwrap()
            .get(&Self::key(location, session_id))
            .cloned()
            .ok_or_else(|| ArchiveError::NotFound(location.describe()))
    }

    async fn delete_resource(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
    ) -> ArchiveResult<()> {
        Self::check_credentials(location, credentials)?;
        let prefix = format!("{}|{}|{}|", location.server, session_id, location.resource);
        let mut files = self.files.lock().unwrap();
        let before = files.len();
        files.retain(|key, _| !key.starts_with(&prefix));
        self.deletes.lock().unwrap().push(prefix);
        if files.len() == before {
            return Err(ArchiveError::NotFound(location.describe()));
        }
        Ok(())
    }
}

/// Prompt with a canned answer that records the questions asked
pub struct ScriptedPrompt {
    answer: Option<String>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn answering(answer: Option<&str>) -> Self {
        Self {
            answer: answer.map(str::to_string),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&self, question: &str) -> ArchiveResult<Option<String>> {
        self.asked.lock().unwrap().push(question.to_string());
        Ok(self.answer.clone())
    }
}
