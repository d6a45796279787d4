//! The scene store and its mutation engine.
//!
//! A [`Scene`] owns the authoritative ordered sequence of elements for one
//! canvas session. Sequence order is paint order. All mutation funnels
//! through the engine methods here, each of which computes the next full
//! element sequence and swaps it in with a single [`Scene::replace`] call,
//! so a render pass never observes a partially applied operation.
//!
//! The engine enforces the referential-integrity rules between editors,
//! texts, and arrows: deleting an arrow demotes its text back to a
//! free-standing annotation, deleting a text removes its arrow, and
//! deleting an editor removes every arrow rooted in it and unlinks the
//! texts those arrows pointed at.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::types::{
    Element, ElementDefaults, ElementId, ElementKind, ElementType, Range,
};

/// The ordered element collection for one canvas session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    elements: Vec<Element>,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the scene seeded for a fresh canvas: one editor block and its
    /// main placeholder callout. Neither carries delete authorization; they
    /// become replaceable only through explanations.
    pub fn seeded(defaults: &ElementDefaults, center: (f32, f32)) -> Self {
        let mut editor = Element::new_editor(1, &defaults.editor, (center.0, center.1 + 80.0));
        editor.deletable = false;
        editor.z_index = Some(0);

        let mut text = Element::new_text(2, &defaults.text, Some(1), (center.0, center.1 - 180.0));
        text.deletable = false;
        text.size = (0.8 * center.0 * 2.0, 220.0);
        if let ElementKind::Text(t) = &mut text.kind {
            t.content = constants::DEFAULT_TEXT_PLACEHOLDER.to_string();
            t.font_size = constants::DEFAULT_TEXT_LARGE_FONT_SIZE;
            t.main = true;
        }

        Self {
            elements: vec![editor, text],
        }
    }

    /// All elements in paint order.
    pub fn all(&self) -> &[Element] {
        &self.elements
    }

    /// Looks up an element by id.
    pub fn by_id(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// All elements of the given kind, in paint order.
    pub fn by_kind(&self, kind: ElementType) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.element_type() == kind)
    }

    /// The main full-explanation text slot for an editor: the text element
    /// with no range whose `editor_id` matches. This is the slot
    /// [`Scene::apply_full_explanation`] overwrites.
    pub fn main_text_of(&self, editor_id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| match &e.kind {
            ElementKind::Text(t) => t.range.is_none() && t.editor_id == Some(editor_id),
            _ => false,
        })
    }

    /// Arrows originating from the given editor.
    pub fn arrows_of_editor(&self, editor_id: ElementId) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| match &e.kind {
            ElementKind::Arrow(a) => a.editor_id == editor_id,
            _ => false,
        })
    }

    /// Text elements whose `arrow_id` references the given arrow.
    pub fn texts_referencing_arrow(&self, arrow_id: ElementId) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| match &e.kind {
            ElementKind::Text(t) => t.arrow_id == Some(arrow_id),
            _ => false,
        })
    }

    /// The next free element id: one past the largest id in the collection,
    /// `1` when the collection is empty.
    pub fn next_id(&self) -> ElementId {
        self.elements.iter().map(|e| e.id).max().map_or(1, |m| m + 1)
    }

    /// Swaps in a full replacement sequence. The only mutator; every engine
    /// operation computes its complete next state and hands it here, so
    /// callers never patch elements in place.
    pub fn replace(&mut self, next: Vec<Element>) {
        debug_assert!(
            {
                let mut ids: Vec<ElementId> = next.iter().map(|e| e.id).collect();
                ids.sort_unstable();
                ids.windows(2).all(|w| w[0] != w[1])
            },
            "element ids must stay unique"
        );
        self.elements = next;
    }

    /// Appends a new editor block, optionally paired with a main text
    /// callout linked to it. Returns the editor id and the text id when a
    /// pair was created.
    pub fn insert_editor(
        &mut self,
        defaults: &ElementDefaults,
        with_text: bool,
        center: (f32, f32),
    ) -> (ElementId, Option<ElementId>) {
        let editor_id = self.next_id();
        let editor = Element::new_editor(editor_id, &defaults.editor, (center.0, center.1 + 80.0));

        let mut next = self.elements.clone();
        next.push(editor);

        let text_id = if with_text {
            let text_id = editor_id + 1;
            let mut text = Element::new_text(
                text_id,
                &defaults.text,
                Some(editor_id),
                (center.0, center.1 - 140.0),
            );
            if let ElementKind::Text(t) = &mut text.kind {
                t.main = true;
            }
            next.push(text);
            Some(text_id)
        } else {
            None
        };

        self.replace(next);
        (editor_id, text_id)
    }

    /// Appends a free-standing (or editor-linked) text callout.
    pub fn insert_text(
        &mut self,
        defaults: &ElementDefaults,
        editor_id: Option<ElementId>,
        center: (f32, f32),
    ) -> ElementId {
        let id = self.next_id();
        let text = Element::new_text(id, &defaults.text, editor_id, center);

        let mut next = self.elements.clone();
        next.push(text);
        self.replace(next);
        id
    }

    /// Replaces an editor's main text slot with the given answer.
    ///
    /// The replacement keeps the slot's sequence position so paint order is
    /// stable, but carries a freshly allocated id. When the editor has no
    /// main slot the explanation is silently dropped and `None` is
    /// returned; stale and fresh answers for the same editor overwrite the
    /// same slot, so re-application is idempotent apart from the id.
    pub fn apply_full_explanation(
        &mut self,
        editor_id: ElementId,
        answer: &str,
    ) -> Option<ElementId> {
        let slot_pos = self.elements.iter().position(|e| match &e.kind {
            ElementKind::Text(t) => t.range.is_none() && t.editor_id == Some(editor_id),
            _ => false,
        })?;

        let new_id = self.next_id();
        let mut replacement = self.elements[slot_pos].clone();
        replacement.id = new_id;
        replacement.deletable = true;
        replacement.visible = true;
        if let ElementKind::Text(t) = &mut replacement.kind {
            t.content = answer.to_string();
            t.main = true;
            t.editor_id = Some(editor_id);
            t.font_size = constants::DEFAULT_TEXT_LARGE_FONT_SIZE;
        }

        let mut next = self.elements.clone();
        next[slot_pos] = replacement;
        self.replace(next);
        Some(new_id)
    }

    /// Appends a selection explanation as an atomic text + arrow pair.
    ///
    /// The two elements take consecutive ids from one allocation scan; the
    /// text's `arrow_id` references the arrow, and the arrow binds to the
    /// start of the selection range on the source editor.
    pub fn apply_selection_explanation(
        &mut self,
        defaults: &ElementDefaults,
        editor_id: ElementId,
        range: Range,
        answer: &str,
        position: (f32, f32),
    ) -> (ElementId, ElementId) {
        let text_id = self.next_id();
        let arrow_id = text_id + 1;

        let mut text = Element::new_text(text_id, &defaults.text, Some(editor_id), position);
        if let ElementKind::Text(t) = &mut text.kind {
            t.content = answer.to_string();
            t.range = Some(range);
            t.arrow_id = Some(arrow_id);
        }

        let arrow = Element::new_arrow(arrow_id, editor_id, range);

        let mut next = self.elements.clone();
        next.push(text);
        next.push(arrow);
        self.replace(next);
        (text_id, arrow_id)
    }

    /// Removes an element and applies the cascade for its kind.
    ///
    /// No-op (returns `false`) when the id is unknown or the element lacks
    /// delete authorization. Returns `true` when the scene changed; the
    /// caller is expected to clear its selection afterwards.
    pub fn delete_element(&mut self, id: ElementId) -> bool {
        let target = match self.by_id(id) {
            Some(e) if e.deletable => e.clone(),
            _ => return false,
        };

        let mut next: Vec<Element> = self
            .elements
            .iter()
            .filter(|e| e.id != id)
            .cloned()
            .collect();

        match target.element_type() {
            ElementType::Arrow => {
                // Demote texts that pointed at this arrow back to
                // free-standing annotations.
                for element in &mut next {
                    if let ElementKind::Text(t) = &mut element.kind {
                        if t.arrow_id == Some(id) {
                            t.arrow_id = None;
                            t.range = None;
                        }
                    }
                }
            }
            ElementType::Text => {
                // The arrow cannot exist without its text.
                if let ElementKind::Text(t) = &target.kind {
                    if let Some(arrow_id) = t.arrow_id {
                        next.retain(|e| {
                            !(e.element_type() == ElementType::Arrow && e.id == arrow_id)
                        });
                    }
                }
            }
            ElementType::Editor => {
                // Arrows cannot survive their source editor; texts that
                // pointed at those arrows are unlinked but kept.
                let removed_arrows: Vec<ElementId> = next
                    .iter()
                    .filter(|e| match &e.kind {
                        ElementKind::Arrow(a) => a.editor_id == id,
                        _ => false,
                    })
                    .map(|e| e.id)
                    .collect();
                next.retain(|e| !removed_arrows.contains(&e.id));
                for element in &mut next {
                    if let ElementKind::Text(t) = &mut element.kind {
                        if t.arrow_id.is_some_and(|a| removed_arrows.contains(&a)) {
                            t.arrow_id = None;
                            t.range = None;
                        }
                    }
                }
            }
            ElementType::Image => {}
        }

        self.replace(next);
        true
    }

    /// Applies a settings change to one element through the engine.
    /// Returns `false` when the id is unknown.
    pub fn update_element(&mut self, id: ElementId, f: impl FnOnce(&mut Element)) -> bool {
        let Some(pos) = self.elements.iter().position(|e| e.id == id) else {
            return false;
        };
        let mut next = self.elements.clone();
        f(&mut next[pos]);
        // A settings change must never reassign identity.
        next[pos].id = id;
        self.replace(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnchorAt, ElementType};

    fn defaults() -> ElementDefaults {
        ElementDefaults::default()
    }

    const CENTER: (f32, f32) = (500.0, 375.0);

    /// Editor E with a selection explanation pair: text T(arrow_id=A) and
    /// arrow A(editor_id=E). Returns (scene, editor, text, arrow).
    fn scene_with_trio() -> (Scene, ElementId, ElementId, ElementId) {
        let mut scene = Scene::new();
        let (editor, _) = scene.insert_editor(&defaults(), false, CENTER);
        let (text, arrow) = scene.apply_selection_explanation(
            &defaults(),
            editor,
            Range::new(1, 1, 1, 5),
            "the variable x",
            CENTER,
        );
        (scene, editor, text, arrow)
    }

    #[test]
    fn test_next_id_on_empty_scene_is_one() {
        assert_eq!(Scene::new().next_id(), 1);
    }

    #[test]
    fn test_next_id_exceeds_every_existing_id() {
        let mut scene = Scene::seeded(&defaults(), CENTER);
        assert_eq!(scene.next_id(), 3);

        scene.insert_text(&defaults(), None, CENTER);
        let max = scene.all().iter().map(|e| e.id).max().unwrap();
        assert_eq!(scene.next_id(), max + 1);
    }

    #[test]
    fn test_ids_stay_unique_across_inserts_and_deletes() {
        let mut scene = Scene::seeded(&defaults(), CENTER);
        scene.insert_editor(&defaults(), true, CENTER);
        scene.insert_text(&defaults(), None, CENTER);
        let (text, arrow) =
            scene.apply_selection_explanation(&defaults(), 1, Range::new(1, 1, 2, 4), "x", CENTER);
        scene.delete_element(arrow);
        scene.insert_text(&defaults(), Some(1), CENTER);
        scene.delete_element(text);

        let mut ids: Vec<ElementId> = scene.all().iter().map(|e| e.id).collect();
        let len = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), len);
    }

    #[test]
    fn test_seeded_scene_shape() {
        let scene = Scene::seeded(&defaults(), CENTER);
        assert_eq!(scene.all().len(), 2);

        let editor = scene.by_id(1).expect("seed editor");
        assert_eq!(editor.element_type(), ElementType::Editor);
        assert!(!editor.deletable);

        let text = scene.by_id(2).expect("seed text");
        let t = text.as_text().unwrap();
        assert_eq!(t.editor_id, Some(1));
        assert!(t.main);
        assert!(!text.deletable);
        assert!(t.content.contains("How it works"));
    }

    #[test]
    fn test_insert_editor_with_paired_main_text() {
        let mut scene = Scene::seeded(&defaults(), CENTER);
        let (editor_id, text_id) = scene.insert_editor(&defaults(), true, CENTER);

        assert_eq!(editor_id, 3);
        assert_eq!(text_id, Some(4));
        let text = scene.by_id(4).unwrap().as_text().unwrap().clone();
        assert_eq!(text.editor_id, Some(3));
        assert!(text.main);
        assert!(scene.by_id(3).unwrap().deletable);
        // The pair lands at the end of the paint order.
        let tail: Vec<ElementId> = scene.all().iter().rev().take(2).map(|e| e.id).collect();
        assert_eq!(tail, vec![4, 3]);
    }

    #[test]
    fn test_insert_text_free_standing() {
        let mut scene = Scene::seeded(&defaults(), CENTER);
        let id = scene.insert_text(&defaults(), None, CENTER);
        assert_eq!(id, 3);
        let t = scene.by_id(3).unwrap().as_text().unwrap().clone();
        assert_eq!(t.editor_id, None);
        assert!(t.range.is_none());
        assert!(!t.main);
    }

    #[test]
    fn test_full_explanation_replaces_slot_in_place() {
        // Scene Store = [Editor(1), Text(2, editor_id=1, main=true)].
        let mut scene = Scene::seeded(&defaults(), CENTER);
        let new_id = scene.apply_full_explanation(1, "it adds numbers");

        assert_eq!(new_id, Some(3));
        assert_eq!(scene.all().len(), 2);
        // Same sequence position, new identity.
        assert_eq!(scene.all()[1].id, 3);
        let t = scene.all()[1].as_text().unwrap();
        assert_eq!(t.content, "it adds numbers");
        assert_eq!(t.editor_id, Some(1));
        assert!(t.main);
        // The replacement gained delete authorization.
        assert!(scene.all()[1].deletable);
        // Editor untouched.
        assert_eq!(scene.all()[0].id, 1);
        assert_eq!(scene.all()[0].element_type(), ElementType::Editor);
    }

    #[test]
    fn test_full_explanation_reapply_overwrites_same_slot() {
        let mut scene = Scene::seeded(&defaults(), CENTER);
        scene.apply_full_explanation(1, "answer-1");
        scene.apply_full_explanation(1, "answer-2");

        let slots: Vec<&Element> = scene
            .by_kind(ElementType::Text)
            .filter(|e| e.as_text().unwrap().editor_id == Some(1))
            .collect();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].as_text().unwrap().content, "answer-2");
        // Still at the original position, after the editor.
        assert_eq!(scene.all()[1].id, slots[0].id);
    }

    #[test]
    fn test_full_explanation_without_slot_is_silent_noop() {
        let mut scene = Scene::new();
        let (editor, _) = scene.insert_editor(&defaults(), false, CENTER);
        let before = scene.clone();

        assert_eq!(scene.apply_full_explanation(editor, "dropped"), None);
        assert_eq!(scene, before);

        // Unknown editor id behaves the same.
        assert_eq!(scene.apply_full_explanation(99, "dropped"), None);
        assert_eq!(scene, before);
    }

    #[test]
    fn test_selection_explanation_appends_atomic_pair() {
        let mut scene = Scene::seeded(&defaults(), CENTER);
        let range = Range::new(1, 1, 1, 5);
        let (text_id, arrow_id) =
            scene.apply_selection_explanation(&defaults(), 1, range, "the variable x", CENTER);

        assert_eq!((text_id, arrow_id), (3, 4));
        assert_eq!(scene.all().len(), 4);

        let text = scene.by_id(text_id).unwrap().as_text().unwrap().clone();
        assert_eq!(text.editor_id, Some(1));
        assert_eq!(text.range, Some(range));
        assert_eq!(text.arrow_id, Some(arrow_id));
        assert_eq!(text.content, "the variable x");

        let arrow = scene.by_id(arrow_id).unwrap().as_arrow().unwrap().clone();
        assert_eq!(arrow.editor_id, 1);
        assert_eq!(arrow.range, range);
        assert_eq!(arrow.anchor_at, AnchorAt::Start);
    }

    #[test]
    fn test_scenario_full_then_selection_then_delete_arrow() {
        let mut scene = Scene::seeded(&defaults(), CENTER);
        scene.apply_full_explanation(1, "it adds numbers");
        // [Editor(1), Text(3)] -> pair takes ids 4 and 5.
        let (text_id, arrow_id) = scene.apply_selection_explanation(
            &defaults(),
            1,
            Range::new(1, 1, 1, 5),
            "the variable x",
            CENTER,
        );
        assert_eq!((text_id, arrow_id), (4, 5));

        assert!(scene.delete_element(5));
        assert!(scene.by_id(5).is_none());
        let t = scene.by_id(4).unwrap().as_text().unwrap().clone();
        assert!(t.arrow_id.is_none());
        assert!(t.range.is_none());
        // Editor and main text untouched.
        assert!(scene.by_id(1).is_some());
        assert!(scene.by_id(3).is_some());
    }

    #[test]
    fn test_delete_arrow_demotes_its_text() {
        let (mut scene, editor, text, arrow) = scene_with_trio();

        assert!(scene.delete_element(arrow));
        assert!(scene.by_id(arrow).is_none());
        let t = scene.by_id(text).unwrap().as_text().unwrap().clone();
        assert!(t.arrow_id.is_none());
        assert!(t.range.is_none());
        // Demoted, not removed; editor unchanged.
        assert_eq!(t.editor_id, Some(editor));
        assert!(scene.by_id(editor).is_some());
    }

    #[test]
    fn test_delete_text_removes_its_arrow() {
        let (mut scene, editor, text, arrow) = scene_with_trio();

        assert!(scene.delete_element(text));
        assert!(scene.by_id(text).is_none());
        assert!(scene.by_id(arrow).is_none());
        assert!(scene.by_id(editor).is_some());
        assert_eq!(scene.all().len(), 1);
    }

    #[test]
    fn test_delete_editor_cascades_to_arrows_and_unlinks_texts() {
        let mut scene = Scene::new();
        let (editor, _) = scene.insert_editor(&defaults(), false, CENTER);
        let (t1, a1) = scene.apply_selection_explanation(
            &defaults(),
            editor,
            Range::new(1, 1, 1, 4),
            "first",
            CENTER,
        );
        let (t2, a2) = scene.apply_selection_explanation(
            &defaults(),
            editor,
            Range::new(2, 1, 2, 8),
            "second",
            CENTER,
        );

        assert!(scene.delete_element(editor));
        assert!(scene.by_id(editor).is_none());
        assert!(scene.by_id(a1).is_none());
        assert!(scene.by_id(a2).is_none());
        for text_id in [t1, t2] {
            let t = scene.by_id(text_id).unwrap().as_text().unwrap().clone();
            assert!(t.arrow_id.is_none());
            assert!(t.range.is_none());
        }
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let (mut scene, ..) = scene_with_trio();
        let before = scene.clone();
        assert!(!scene.delete_element(999));
        assert_eq!(scene, before);
    }

    #[test]
    fn test_delete_without_authorization_is_noop() {
        // Seeded elements carry no delete authorization.
        let mut scene = Scene::seeded(&defaults(), CENTER);
        let before = scene.clone();
        assert!(!scene.delete_element(1));
        assert!(!scene.delete_element(2));
        assert_eq!(scene, before);
    }

    #[test]
    fn test_main_text_lookup_ignores_ranged_texts() {
        let (mut scene, editor, ..) = scene_with_trio();
        // Only the ranged selection text exists, so there is no main slot.
        assert!(scene.main_text_of(editor).is_none());

        let text_id = scene.insert_text(&defaults(), Some(editor), CENTER);
        assert_eq!(scene.main_text_of(editor).map(|e| e.id), Some(text_id));
    }

    #[test]
    fn test_relation_accessors() {
        let (scene, editor, text, arrow) = scene_with_trio();

        let arrows: Vec<ElementId> = scene.arrows_of_editor(editor).map(|e| e.id).collect();
        assert_eq!(arrows, vec![arrow]);

        let texts: Vec<ElementId> = scene.texts_referencing_arrow(arrow).map(|e| e.id).collect();
        assert_eq!(texts, vec![text]);
    }

    #[test]
    fn test_by_kind_preserves_paint_order() {
        let mut scene = Scene::seeded(&defaults(), CENTER);
        scene.insert_text(&defaults(), None, CENTER);
        let texts: Vec<ElementId> = scene.by_kind(ElementType::Text).map(|e| e.id).collect();
        assert_eq!(texts, vec![2, 3]);
    }

    #[test]
    fn test_update_element_changes_settings_but_not_identity() {
        let mut scene = Scene::seeded(&defaults(), CENTER);
        let changed = scene.update_element(2, |e| {
            e.id = 77; // must be ignored
            if let ElementKind::Text(t) = &mut e.kind {
                t.font_size = 21.0;
                t.rounded = true;
            }
        });
        assert!(changed);
        let t = scene.by_id(2).unwrap().as_text().unwrap().clone();
        assert_eq!(t.font_size, 21.0);
        assert!(t.rounded);

        assert!(!scene.update_element(42, |_| {}));
    }
}
