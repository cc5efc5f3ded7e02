//! # Host Frame Element
//!
//! Models the element that hosts the dashboard. A parent may select a group
//! by setting `data-group-code` on it instead of posting `GPS_SET_GROUP`.
//! The observer here turns attribute changes into the same
//! [`ControllerEvent::GroupSelected`] the message path produces.

use std::collections::BTreeMap;

use tokio::sync::watch;

use super::controller::{ControllerEvent, GroupOrigin};

/// Attributes of the hosting element.
#[derive(Debug)]
pub struct FrameElement {
    attributes: watch::Sender<BTreeMap<String, String>>,
}

impl FrameElement {
    pub fn new() -> Self {
        let (attributes, _) = watch::channel(BTreeMap::new());
        Self { attributes }
    }

    pub fn with_attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        let frame = Self::new();
        frame.set_attribute(name, value);
        frame
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        self.attributes.send_if_modified(|attributes| {
            if attributes.get(&name) == Some(&value) {
                return false;
            }
            attributes.insert(name, value);
            true
        });
    }

    pub fn remove_attribute(&self, name: &str) {
        self.attributes
            .send_if_modified(|attributes| attributes.remove(name).is_some());
    }

    /// Observe one attribute.
    pub fn observe(&self, name: impl Into<String>) -> AttributeObserver {
        AttributeObserver {
            name: name.into(),
            rx: self.attributes.subscribe(),
            last: None,
        }
    }
}

impl Default for FrameElement {
    fn default() -> Self {
        Self::new()
    }
}

/// Yields the values of a single attribute as they change.
pub struct AttributeObserver {
    name: String,
    rx: watch::Receiver<BTreeMap<String, String>>,
    last: Option<String>,
}

impl AttributeObserver {
    /// Current value, marking it as seen.
    pub fn current(&mut self) -> Option<String> {
        let value = self.rx.borrow_and_update().get(&self.name).cloned();
        self.last = value.clone();
        value
    }

    /// Wait for the observed attribute to take a different value. Changes to
    /// other attributes are skipped. `None` when the element is gone.
    pub async fn changed(&mut self) -> Option<Option<String>> {
        loop {
            self.rx.changed().await.ok()?;
            let value = self.rx.borrow_and_update().get(&self.name).cloned();
            if value != self.last {
                self.last = value.clone();
                return Some(value);
            }
        }
    }
}

/// Forward non-empty attribute values as group selections, starting with the
/// value present at subscription time. Runs until the element or the
/// controller goes away.
pub async fn forward_group_attribute(
    mut observer: AttributeObserver,
    events: async_channel::Sender<ControllerEvent>,
) {
    let mut next = observer.current();
    loop {
        if let Some(code) = next.filter(|code| !code.trim().is_empty()) {
            tracing::debug!(group_code = %code, "Group attribute observed");
            let event = ControllerEvent::GroupSelected {
                code,
                origin: GroupOrigin::FrameAttribute,
            };
            if events.send(event).await.is_err() {
                return;
            }
        }
        match observer.changed().await {
            Some(value) => next = value,
            None => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::protocol::GROUP_CODE_ATTRIBUTE;

    #[test]
    fn test_attributes() {
        let frame = FrameElement::with_attribute(GROUP_CODE_ATTRIBUTE, "SAGU");
        assert_eq!(frame.get_attribute(GROUP_CODE_ATTRIBUTE).as_deref(), Some("SAGU"));
        frame.remove_attribute(GROUP_CODE_ATTRIBUTE);
        assert_eq!(frame.get_attribute(GROUP_CODE_ATTRIBUTE), None);
    }

    #[tokio::test]
    async fn test_observer_skips_unrelated_attributes() {
        let frame = FrameElement::new();
        let mut observer = frame.observe(GROUP_CODE_ATTRIBUTE);
        assert_eq!(observer.current(), None);

        frame.set_attribute("title", "Fleet");
        frame.set_attribute(GROUP_CODE_ATTRIBUTE, "G1");

        assert_eq!(observer.changed().await, Some(Some("G1".to_string())));
    }

    #[tokio::test]
    async fn test_forward_emits_initial_and_changed_values() {
        // Arrange
        let frame = FrameElement::with_attribute(GROUP_CODE_ATTRIBUTE, "G1");
        let (tx, rx) = async_channel::unbounded();
        let task = tokio::spawn(forward_group_attribute(frame.observe(GROUP_CODE_ATTRIBUTE), tx));

        // Act
        let first = rx.recv().await.expect("initial");
        frame.set_attribute(GROUP_CODE_ATTRIBUTE, "");
        frame.set_attribute(GROUP_CODE_ATTRIBUTE, "G2");
        let second = rx.recv().await.expect("changed");

        // Assert
        assert_eq!(
            first,
            ControllerEvent::GroupSelected { code: "G1".to_string(), origin: GroupOrigin::FrameAttribute }
        );
        assert_eq!(
            second,
            ControllerEvent::GroupSelected { code: "G2".to_string(), origin: GroupOrigin::FrameAttribute }
        );
        task.abort();
    }
}
