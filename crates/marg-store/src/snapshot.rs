use std::collections::BTreeMap;

use marg_types::ObjectId;

use crate::commit::Change;
use crate::error::{StoreError, StoreResult};
use crate::object::StoreObject;
use crate::transaction::Action;

/// The full set of objects visible at one commit, grouped by class.
///
/// A class appears once its first object is created and stays listed (possibly
/// empty) after all its objects are deleted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    classes: BTreeMap<String, BTreeMap<ObjectId, StoreObject>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Objects of `class` in `ObjectId` order, or `None` if the class is unknown.
    pub fn objects_of_class(&self, class: &str) -> Option<Vec<StoreObject>> {
        self.classes
            .get(class)
            .map(|objects| objects.values().cloned().collect())
    }

    /// Look up an object by id in any class.
    pub fn get(&self, id: &ObjectId) -> Option<&StoreObject> {
        self.classes.values().find_map(|objects| objects.get(id))
    }

    /// Total number of live objects.
    pub fn len(&self) -> usize {
        self.classes.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply transaction mutations, returning the changes they produced.
    ///
    /// On error the snapshot may be partially modified; callers stage against
    /// a clone.
    pub fn apply_actions(&mut self, actions: &[Action]) -> StoreResult<Vec<Change>> {
        let mut changes = Vec::with_capacity(actions.len());
        for action in actions {
            let change = match action {
                Action::Create { class, properties } => {
                    let object = StoreObject {
                        id: ObjectId::new(),
                        class: class.clone(),
                        properties: properties.clone(),
                    };
                    Change::Created { object }
                }
                Action::Update {
                    object,
                    remove,
                    set,
                } => {
                    let mut updated = self
                        .get(object)
                        .cloned()
                        .ok_or(StoreError::ObjectNotFound(*object))?;
                    for name in remove {
                        updated.properties.remove(name);
                    }
                    updated
                        .properties
                        .extend(set.iter().map(|(k, v)| (k.clone(), v.clone())));
                    Change::Updated { object: updated }
                }
                Action::Delete { object } => {
                    let existing = self.get(object).ok_or(StoreError::ObjectNotFound(*object))?;
                    Change::Deleted {
                        id: *object,
                        class: existing.class.clone(),
                    }
                }
                Action::Begin { .. } | Action::Commit(_) => {
                    return Err(StoreError::MalformedTransaction(
                        "control action passed as mutation".into(),
                    ))
                }
            };
            self.apply_change(&change);
            changes.push(change);
        }
        Ok(changes)
    }

    /// Replay one recorded change.
    pub fn apply_change(&mut self, change: &Change) {
        match change {
            Change::Created { object } | Change::Updated { object } => {
                self.classes
                    .entry(object.class.clone())
                    .or_default()
                    .insert(object.id, object.clone());
            }
            Change::Deleted { id, class } => {
                if let Some(objects) = self.classes.get_mut(class) {
                    objects.remove(id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(class: &str, value: &str) -> Action {
        Action::Create {
            class: class.into(),
            properties: BTreeMap::from([("v".to_string(), value.to_string())]),
        }
    }

    #[test]
    fn unknown_class_is_none() {
        assert!(Snapshot::new().objects_of_class("note").is_none());
    }

    #[test]
    fn create_registers_class_and_object() {
        let mut snap = Snapshot::new();
        let changes = snap.apply_actions(&[create("note", "a")]).unwrap();
        assert_eq!(changes.len(), 1);
        let objects = snap.objects_of_class("note").unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].property("v"), Some("a"));
    }

    #[test]
    fn objects_are_listed_in_id_order() {
        let mut snap = Snapshot::new();
        snap.apply_actions(&[create("note", "a"), create("note", "b"), create("note", "c")])
            .unwrap();
        let ids: Vec<ObjectId> = snap
            .objects_of_class("note")
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn update_removes_then_sets_on_same_identity() {
        let mut snap = Snapshot::new();
        snap.apply_actions(&[create("note", "a")]).unwrap();
        let id = snap.objects_of_class("note").unwrap()[0].id;
        snap.apply_actions(&[Action::Update {
            object: id,
            remove: vec!["v".into()],
            set: BTreeMap::from([("w".to_string(), "b".to_string())]),
        }])
        .unwrap();
        let obj = snap.get(&id).unwrap();
        assert_eq!(obj.property("v"), None);
        assert_eq!(obj.property("w"), Some("b"));
    }

    #[test]
    fn delete_keeps_class_listed() {
        let mut snap = Snapshot::new();
        snap.apply_actions(&[create("note", "a")]).unwrap();
        let id = snap.objects_of_class("note").unwrap()[0].id;
        snap.apply_actions(&[Action::Delete { object: id }]).unwrap();
        assert!(snap.get(&id).is_none());
        assert_eq!(snap.objects_of_class("note"), Some(vec![]));
        assert!(snap.is_empty());
    }

    #[test]
    fn mutating_missing_object_fails() {
        let mut snap = Snapshot::new();
        let id = ObjectId::new();
        assert!(matches!(
            snap.apply_actions(&[Action::Delete { object: id }]),
            Err(StoreError::ObjectNotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn replaying_changes_reproduces_snapshot() {
        let mut original = Snapshot::new();
        let mut changes = original
            .apply_actions(&[create("note", "a"), create("tag", "b")])
            .unwrap();
        let id = original.objects_of_class("note").unwrap()[0].id;
        changes.extend(original.apply_actions(&[Action::Delete { object: id }]).unwrap());

        let mut replayed = Snapshot::new();
        for change in &changes {
            replayed.apply_change(change);
        }
        assert_eq!(replayed, original);
    }
}
