//! Outstanding permission prompts
//!
//! A page asking for a capability with no stored decision parks its reply
//! channel here until the UI answers with the matching request id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::PrivacyError;
use crate::permissions::PermissionKind;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionPrompt {
    pub origin: String,
    pub permission: PermissionKind,
    pub request_id: u64,
}

pub struct PendingPrompts<R> {
    next_id: u64,
    pending: HashMap<u64, (PermissionPrompt, R)>,
}

impl<R> PendingPrompts<R> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: HashMap::new(),
        }
    }

    pub fn open(&mut self, origin: String, permission: PermissionKind, responder: R) -> PermissionPrompt {
        self.next_id += 1;
        let prompt = PermissionPrompt {
            origin,
            permission,
            request_id: self.next_id,
        };

        tracing::debug!(
            request_id = prompt.request_id,
            origin = %prompt.origin,
            permission = %prompt.permission,
            "Opened permission prompt"
        );

        self.pending.insert(prompt.request_id, (prompt.clone(), responder));
        prompt
    }

    pub fn resolve(&mut self, request_id: u64) -> Result<(PermissionPrompt, R)> {
        self.pending
            .remove(&request_id)
            .ok_or(PrivacyError::UnknownRequest(request_id))
    }

    /// Other prompts waiting on the same origin and capability, so one
    /// answer can settle them all.
    pub fn take_matching(&mut self, origin: &str, permission: PermissionKind) -> Vec<(PermissionPrompt, R)> {
        let ids: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, (p, _))| p.origin == origin && p.permission == permission)
            .map(|(id, _)| *id)
            .collect();

        ids.into_iter()
            .filter_map(|id| self.pending.remove(&id))
            .collect()
    }

    pub fn prompts(&self) -> Vec<PermissionPrompt> {
        let mut prompts: Vec<PermissionPrompt> =
            self.pending.values().map(|(p, _)| p.clone()).collect();
        prompts.sort_by_key(|p| p.request_id);
        prompts
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<R> Default for PendingPrompts<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_resolve() {
        let mut prompts: PendingPrompts<&'static str> = PendingPrompts::new();

        let first = prompts.open("https://a.test".to_string(), PermissionKind::Camera, "reply-1");
        let second = prompts.open("https://a.test".to_string(), PermissionKind::Camera, "reply-2");
        assert_ne!(first.request_id, second.request_id);
        assert_eq!(prompts.prompts()[0], first);

        let (prompt, reply) = prompts.resolve(first.request_id).unwrap();
        assert_eq!(prompt.origin, "https://a.test");
        assert_eq!(reply, "reply-1");

        assert!(matches!(
            prompts.resolve(first.request_id),
            Err(PrivacyError::UnknownRequest(_))
        ));
    }

    #[test]
    fn test_take_matching() {
        let mut prompts: PendingPrompts<u8> = PendingPrompts::new();
        prompts.open("https://a.test".to_string(), PermissionKind::Camera, 1);
        prompts.open("https://a.test".to_string(), PermissionKind::Microphone, 2);
        prompts.open("https://a.test".to_string(), PermissionKind::Camera, 3);

        let taken = prompts.take_matching("https://a.test", PermissionKind::Camera);
        assert_eq!(taken.len(), 2);
        assert_eq!(prompts.len(), 1);
    }

    #[test]
    fn test_prompt_wire_shape() {
        let prompt = PermissionPrompt {
            origin: "https://a.test".to_string(),
            permission: PermissionKind::Geolocation,
            request_id: 7,
        };
        let json = serde_json::to_value(&prompt).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"origin": "https://a.test", "permission": "geolocation", "requestId": 7})
        );
    }
}
