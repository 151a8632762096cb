//! エディタ状態のストア
//!
//! 変更はすべて `reduce` で新しい状態を作って差し替える。ページ集合が
//! 変わる操作だけ、差し替え直前のスナップショットを履歴に積む。

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::constants::{DEFAULT_BOX_WIDTH_RATIO, LAYOUT_GAP};
use crate::editor::history::History;
use crate::editor::layout::{layout_page, Canvas, EstimatedMetrics, TextMeasure};
use crate::editor::parser::parse_raw_text;
use crate::error::EditorError;
use crate::types::{
    EditorState, ImportMode, MaskObject, NewPage, Page, SavedStyle, TextObject, TextStyle,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EditorAction {
    AddPages { pages: Vec<NewPage> },
    RemovePage { page_id: String },
    MovePage { page_id: String, to_index: usize },
    SelectPage { page_id: Option<String> },
    SelectText { text_id: Option<String> },
    SelectMask { mask_id: Option<String> },
    SetGalleryView { enabled: bool },
    SetHideLabels { enabled: bool },
    SetImportMode { mode: ImportMode },
    SetPageImportMode { page_id: String, mode: Option<ImportMode> },
    SetPreviewWidth { width: f64 },
    ImportText { raw: String },
    AddText { page_id: String, text: String },
    EditText { page_id: String, text_id: String, text: String },
    MoveText { page_id: String, text_id: String, x: f64, y: f64 },
    ResizeText { page_id: String, text_id: String, width: f64 },
    SetTextVisible { page_id: String, text_id: String, visible: bool },
    SetTextStyle { page_id: String, text_id: String, style: TextStyle },
    DeleteText { page_id: String, text_id: String },
    AddMask { page_id: String, mask: MaskObject },
    UpdateMask { page_id: String, mask: MaskObject },
    DeleteMask { page_id: String, mask_id: String },
    DeleteSelected,
    SetGlobalStyle { style: TextStyle },
    ActivateLocalStyle { page_id: String },
    UpdateLocalStyle { page_id: String, style: TextStyle },
    ResetLocalStyle { page_id: String },
    SaveStyle { name: String },
    ApplySavedStyle { name: String, page_id: Option<String> },
    DeleteSavedStyle { name: String },
    AutoLayout { page_id: String },
}

impl EditorAction {
    /// 表示設定や選択は履歴に残さない
    pub fn is_recorded(&self) -> bool {
        !matches!(
            self,
            EditorAction::SelectPage { .. }
                | EditorAction::SelectText { .. }
                | EditorAction::SelectMask { .. }
                | EditorAction::SetGalleryView { .. }
                | EditorAction::SetHideLabels { .. }
                | EditorAction::SetImportMode { .. }
                | EditorAction::SetPreviewWidth { .. }
                | EditorAction::SaveStyle { .. }
                | EditorAction::DeleteSavedStyle { .. }
        )
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn page_index(state: &EditorState, page_id: &str) -> Result<usize, EditorError> {
    state
        .pages
        .iter()
        .position(|p| p.id == page_id)
        .ok_or_else(|| EditorError::PageNotFound(page_id.to_string()))
}

// 選択は選択中ページの要素に限る
fn selected_page(state: &EditorState) -> Option<&Page> {
    let id = state.selected_page_id.as_deref()?;
    state.pages.iter().find(|p| p.id == id)
}

fn text_mut<'a>(page: &'a mut Page, text_id: &str) -> Result<&'a mut TextObject, EditorError> {
    page.text_objects
        .iter_mut()
        .find(|t| t.id == text_id)
        .ok_or_else(|| EditorError::TextNotFound(text_id.to_string()))
}

fn validate_style(style: &TextStyle) -> Result<(), EditorError> {
    style.validate().map_err(EditorError::InvalidStyle)
}

fn relayout(state: &mut EditorState, index: usize, measure: &dyn TextMeasure) {
    let global = state.global_style.clone();
    let preview_width = state.preview_width;
    let hide_labels = state.hide_labels;
    let page = &mut state.pages[index];
    let (width, height) = page.preview_canvas(preview_width);
    layout_page(page, &global, Canvas { width, height }, LAYOUT_GAP, hide_labels, measure);
}

fn relayout_if_auto(state: &mut EditorState, index: usize, measure: &dyn TextMeasure) {
    if state.pages[index].auto_layout {
        relayout(state, index, measure);
    }
}

fn relayout_all(state: &mut EditorState, measure: &dyn TextMeasure) {
    for index in 0..state.pages.len() {
        relayout_if_auto(state, index, measure);
    }
}

// ページのテキストにページの有効スタイルを適用
fn restyle_page(state: &mut EditorState, index: usize) {
    let style = state.pages[index].effective_style(&state.global_style).clone();
    for object in &mut state.pages[index].text_objects {
        object.style = style.clone();
    }
}

fn clear_selection_on(state: &mut EditorState, index: usize) {
    let page = &state.pages[index];
    if let Some(text_id) = &state.selected_text_id {
        if !page.text_objects.iter().any(|t| &t.id == text_id) {
            state.selected_text_id = None;
        }
    }
    if let Some(mask_id) = &state.selected_mask_id {
        if !page.masks.iter().any(|m| &m.id == mask_id) {
            state.selected_mask_id = None;
        }
    }
}

/// 取り込みモードに応じてセリフからテキストを作る
fn build_import_objects(lines: &[String], mode: ImportMode, style: &TextStyle, canvas_width: f64) -> Vec<TextObject> {
    let make = |text: String, width: f64| TextObject {
        id: new_id(),
        original_text: text,
        x: 0.0,
        y: 0.0,
        width: width.max(1.0),
        visible: true,
        style: style.clone(),
    };
    match mode {
        ImportMode::Full => {
            let width = canvas_width - 2.0 * style.padding.horizontal();
            lines.iter().map(|line| make(line.clone(), width)).collect()
        }
        ImportMode::Box => vec![make(lines.join("\n"), canvas_width * DEFAULT_BOX_WIDTH_RATIO)],
    }
}

fn import_text(state: &mut EditorState, raw: &str, measure: &dyn TextMeasure) {
    let parsed = parse_raw_text(raw);
    for (page_number, lines) in parsed {
        let Some(index) = (page_number as usize).checked_sub(1).filter(|i| *i < state.pages.len()) else {
            debug!("取り込み対象のページがありません: {}", page_number);
            continue;
        };
        let mode = state.pages[index].effective_import_mode(state.import_mode);
        let style = state.pages[index].effective_style(&state.global_style).clone();
        let (canvas_width, _) = state.pages[index].preview_canvas(state.preview_width);

        let page = &mut state.pages[index];
        page.text_objects = build_import_objects(&lines, mode, &style, canvas_width);
        page.auto_layout = true;
        clear_selection_on(state, index);
        relayout(state, index, measure);
    }
}

fn set_page_style(state: &mut EditorState, index: usize, style: TextStyle, measure: &dyn TextMeasure) {
    let page = &mut state.pages[index];
    page.is_local_style = true;
    page.local_style = Some(style);
    restyle_page(state, index);
    relayout_if_auto(state, index, measure);
}

fn set_global_style(state: &mut EditorState, style: TextStyle, measure: &dyn TextMeasure) {
    state.global_style = style;
    for index in 0..state.pages.len() {
        if !state.pages[index].is_local_style {
            restyle_page(state, index);
            relayout_if_auto(state, index, measure);
        }
    }
}

fn delete_text(state: &mut EditorState, index: usize, text_id: &str, measure: &dyn TextMeasure) -> Result<(), EditorError> {
    let page = &mut state.pages[index];
    let before = page.text_objects.len();
    page.text_objects.retain(|t| t.id != text_id);
    if page.text_objects.len() == before {
        return Err(EditorError::TextNotFound(text_id.to_string()));
    }
    if state.selected_text_id.as_deref() == Some(text_id) {
        state.selected_text_id = None;
    }
    relayout_if_auto(state, index, measure);
    Ok(())
}

fn delete_mask(state: &mut EditorState, index: usize, mask_id: &str) -> Result<(), EditorError> {
    let page = &mut state.pages[index];
    let before = page.masks.len();
    page.masks.retain(|m| m.id != mask_id);
    if page.masks.len() == before {
        return Err(EditorError::MaskNotFound(mask_id.to_string()));
    }
    if state.selected_mask_id.as_deref() == Some(mask_id) {
        state.selected_mask_id = None;
    }
    Ok(())
}

fn validate_mask(mask: &MaskObject) -> Result<(), EditorError> {
    let sizes_ok = [mask.width, mask.height, mask.stroke_width]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0);
    let opacity_ok = mask.opacity.map_or(true, |o| (0.0..=1.0).contains(&o));
    if sizes_ok && opacity_ok {
        Ok(())
    } else {
        Err(EditorError::InvalidValue(format!("mask {}", mask.id)))
    }
}

/// 状態遷移本体（入力状態は変更しない）
pub fn reduce(
    current: &EditorState,
    action: &EditorAction,
    measure: &dyn TextMeasure,
) -> Result<EditorState, EditorError> {
    let mut state = current.clone();

    match action {
        EditorAction::AddPages { pages } => {
            for new_page in pages {
                state.pages.push(Page {
                    id: new_id(),
                    image_path: new_page.image_path.clone(),
                    file_name: new_page.file_name.clone(),
                    image_width: new_page.image_width,
                    image_height: new_page.image_height,
                    text_objects: Vec::new(),
                    masks: Vec::new(),
                    is_local_style: false,
                    local_style: None,
                    import_mode: None,
                    auto_layout: true,
                });
            }
        }
        EditorAction::RemovePage { page_id } => {
            let index = page_index(&state, page_id)?;
            state.pages.remove(index);
            if state.selected_page_id.as_deref() == Some(page_id.as_str()) {
                state.selected_page_id = None;
                state.selected_text_id = None;
                state.selected_mask_id = None;
            }
        }
        EditorAction::MovePage { page_id, to_index } => {
            let index = page_index(&state, page_id)?;
            let page = state.pages.remove(index);
            let target = (*to_index).min(state.pages.len());
            state.pages.insert(target, page);
        }
        EditorAction::SelectPage { page_id } => {
            if let Some(id) = page_id {
                page_index(&state, id)?;
                state.is_gallery_view = false;
            }
            state.selected_page_id = page_id.clone();
            state.selected_text_id = None;
            state.selected_mask_id = None;
        }
        EditorAction::SelectText { text_id } => {
            if let Some(id) = text_id {
                let found = selected_page(&state).is_some_and(|p| p.text_objects.iter().any(|t| &t.id == id));
                if !found {
                    return Err(EditorError::TextNotFound(id.clone()));
                }
                state.selected_mask_id = None;
            }
            state.selected_text_id = text_id.clone();
        }
        EditorAction::SelectMask { mask_id } => {
            if let Some(id) = mask_id {
                let found = selected_page(&state).is_some_and(|p| p.masks.iter().any(|m| &m.id == id));
                if !found {
                    return Err(EditorError::MaskNotFound(id.clone()));
                }
                state.selected_text_id = None;
            }
            state.selected_mask_id = mask_id.clone();
        }
        EditorAction::SetGalleryView { enabled } => {
            state.is_gallery_view = *enabled;
        }
        EditorAction::SetHideLabels { enabled } => {
            state.hide_labels = *enabled;
            relayout_all(&mut state, measure);
        }
        EditorAction::SetImportMode { mode } => {
            state.import_mode = *mode;
        }
        EditorAction::SetPageImportMode { page_id, mode } => {
            let index = page_index(&state, page_id)?;
            state.pages[index].import_mode = *mode;
        }
        EditorAction::SetPreviewWidth { width } => {
            if !(width.is_finite() && *width > 0.0) {
                return Err(EditorError::InvalidValue(format!("preview width {}", width)));
            }
            state.preview_width = *width;
            relayout_all(&mut state, measure);
        }
        EditorAction::ImportText { raw } => {
            import_text(&mut state, raw, measure);
        }
        EditorAction::AddText { page_id, text } => {
            let index = page_index(&state, page_id)?;
            let style = state.pages[index].effective_style(&state.global_style).clone();
            let (canvas_width, _) = state.pages[index].preview_canvas(state.preview_width);
            let id = new_id();
            state.pages[index].text_objects.push(TextObject {
                id: id.clone(),
                original_text: text.clone(),
                x: 10.0,
                y: 10.0,
                width: canvas_width * DEFAULT_BOX_WIDTH_RATIO,
                visible: true,
                style,
            });
            state.selected_text_id = Some(id);
            state.selected_mask_id = None;
            relayout_if_auto(&mut state, index, measure);
        }
        EditorAction::EditText { page_id, text_id, text } => {
            let index = page_index(&state, page_id)?;
            text_mut(&mut state.pages[index], text_id)?.original_text = text.clone();
            relayout_if_auto(&mut state, index, measure);
        }
        EditorAction::MoveText { page_id, text_id, x, y } => {
            let index = page_index(&state, page_id)?;
            let page = &mut state.pages[index];
            let object = text_mut(page, text_id)?;
            object.x = x.clamp(0.0, 100.0);
            object.y = y.clamp(0.0, 100.0);
            // 手動配置したページは自動配置を止める
            page.auto_layout = false;
        }
        EditorAction::ResizeText { page_id, text_id, width } => {
            if !(width.is_finite() && *width > 0.0) {
                return Err(EditorError::InvalidValue(format!("text width {}", width)));
            }
            let index = page_index(&state, page_id)?;
            text_mut(&mut state.pages[index], text_id)?.width = *width;
            relayout_if_auto(&mut state, index, measure);
        }
        EditorAction::SetTextVisible { page_id, text_id, visible } => {
            let index = page_index(&state, page_id)?;
            text_mut(&mut state.pages[index], text_id)?.visible = *visible;
            relayout_if_auto(&mut state, index, measure);
        }
        EditorAction::SetTextStyle { page_id, text_id, style } => {
            validate_style(style)?;
            let index = page_index(&state, page_id)?;
            text_mut(&mut state.pages[index], text_id)?.style = style.clone();
            relayout_if_auto(&mut state, index, measure);
        }
        EditorAction::DeleteText { page_id, text_id } => {
            let index = page_index(&state, page_id)?;
            delete_text(&mut state, index, text_id, measure)?;
        }
        EditorAction::AddMask { page_id, mask } => {
            validate_mask(mask)?;
            let index = page_index(&state, page_id)?;
            let mut mask = mask.clone();
            if mask.id.is_empty() {
                mask.id = new_id();
            }
            state.selected_mask_id = Some(mask.id.clone());
            state.selected_text_id = None;
            state.pages[index].masks.push(mask);
        }
        EditorAction::UpdateMask { page_id, mask } => {
            validate_mask(mask)?;
            let index = page_index(&state, page_id)?;
            let slot = state.pages[index]
                .masks
                .iter_mut()
                .find(|m| m.id == mask.id)
                .ok_or_else(|| EditorError::MaskNotFound(mask.id.clone()))?;
            *slot = mask.clone();
        }
        EditorAction::DeleteMask { page_id, mask_id } => {
            let index = page_index(&state, page_id)?;
            delete_mask(&mut state, index, mask_id)?;
        }
        EditorAction::DeleteSelected => {
            let Some(page_id) = state.selected_page_id.clone() else {
                return Ok(state);
            };
            let index = page_index(&state, &page_id)?;
            if let Some(text_id) = state.selected_text_id.clone() {
                delete_text(&mut state, index, &text_id, measure)?;
            } else if let Some(mask_id) = state.selected_mask_id.clone() {
                delete_mask(&mut state, index, &mask_id)?;
            }
        }
        EditorAction::SetGlobalStyle { style } => {
            validate_style(style)?;
            set_global_style(&mut state, style.clone(), measure);
        }
        EditorAction::ActivateLocalStyle { page_id } => {
            let index = page_index(&state, page_id)?;
            let copy = state.pages[index]
                .local_style
                .clone()
                .unwrap_or_else(|| state.global_style.clone());
            set_page_style(&mut state, index, copy, measure);
        }
        EditorAction::UpdateLocalStyle { page_id, style } => {
            validate_style(style)?;
            let index = page_index(&state, page_id)?;
            set_page_style(&mut state, index, style.clone(), measure);
        }
        EditorAction::ResetLocalStyle { page_id } => {
            let index = page_index(&state, page_id)?;
            let page = &mut state.pages[index];
            page.is_local_style = false;
            page.local_style = None;
            restyle_page(&mut state, index);
            relayout_if_auto(&mut state, index, measure);
        }
        EditorAction::SaveStyle { name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(EditorError::InvalidValue("style name".to_string()));
            }
            let saved = SavedStyle { name: name.to_string(), style: state.global_style.clone() };
            match state.saved_styles.iter_mut().find(|s| s.name == name) {
                Some(existing) => *existing = saved,
                None => state.saved_styles.push(saved),
            }
        }
        EditorAction::ApplySavedStyle { name, page_id } => {
            let style = state
                .saved_styles
                .iter()
                .find(|s| &s.name == name)
                .map(|s| s.style.clone())
                .ok_or_else(|| EditorError::StyleNotFound(name.clone()))?;
            match page_id {
                Some(id) => {
                    let index = page_index(&state, id)?;
                    set_page_style(&mut state, index, style, measure);
                }
                None => set_global_style(&mut state, style, measure),
            }
        }
        EditorAction::DeleteSavedStyle { name } => {
            state.saved_styles.retain(|s| &s.name != name);
        }
        EditorAction::AutoLayout { page_id } => {
            let index = page_index(&state, page_id)?;
            state.pages[index].auto_layout = true;
            relayout(&mut state, index, measure);
        }
    }

    Ok(state)
}

/// 現在の状態と履歴を保持するストア
pub struct EditorStore {
    state: EditorState,
    history: History,
    measure: EstimatedMetrics,
}

impl EditorStore {
    pub fn new(state: EditorState) -> Self {
        Self {
            state,
            history: History::new(),
            measure: EstimatedMetrics,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn dispatch(&mut self, action: &EditorAction) -> Result<&EditorState, EditorError> {
        let next = reduce(&self.state, action, &self.measure)?;
        if action.is_recorded() && next.pages != self.state.pages {
            self.history.record(&self.state.pages);
        }
        self.state = next;
        Ok(&self.state)
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.state.pages);
        if changed {
            self.after_history_swap();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.state.pages);
        if changed {
            self.after_history_swap();
        }
        changed
    }

    // 履歴のページは記録時の表示設定で配置されているので、現在の設定で並べ直す
    fn after_history_swap(&mut self) {
        relayout_all(&mut self.state, &self.measure);
        self.fix_selection();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// 読み込んだ状態で置き換える（履歴は破棄）
    pub fn replace(&mut self, state: EditorState) {
        self.state = state;
        self.history.clear();
    }

    // 履歴の入れ替えで消えた要素の選択を外す
    fn fix_selection(&mut self) {
        let state = &mut self.state;
        let page = state
            .selected_page_id
            .as_deref()
            .and_then(|id| state.pages.iter().find(|p| p.id == id));
        let Some(page) = page else {
            state.selected_page_id = None;
            state.selected_text_id = None;
            state.selected_mask_id = None;
            return;
        };
        if let Some(text_id) = &state.selected_text_id {
            if !page.text_objects.iter().any(|t| &t.id == text_id) {
                state.selected_text_id = None;
            }
        }
        if let Some(mask_id) = &state.selected_mask_id {
            if !page.masks.iter().any(|m| &m.id == mask_id) {
                state.selected_mask_id = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MaskKind, MaskShape, VerticalAlignment};

    fn store_with_pages(count: usize) -> EditorStore {
        let mut store = EditorStore::new(EditorState::default());
        let pages = (0..count)
            .map(|i| NewPage {
                image_path: format!("/tmp/page{}.png", i + 1),
                file_name: format!("page{}.png", i + 1),
                image_width: 1600,
                image_height: 2400,
            })
            .collect();
        store.dispatch(&EditorAction::AddPages { pages }).expect("add pages");
        store
    }

    fn page_id(store: &EditorStore, index: usize) -> String {
        store.state().pages[index].id.clone()
    }

    fn mask(id: &str) -> MaskObject {
        MaskObject {
            id: id.to_string(),
            x: 10.0,
            y: 10.0,
            width: 50.0,
            height: 30.0,
            fill: "#ffffff".to_string(),
            kind: MaskKind::Rect,
            opacity: None,
            visible: true,
            shape: MaskShape::Rect,
            stroke: "#000000".to_string(),
            stroke_width: 0.0,
        }
    }

    #[test]
    fn import_text_creates_objects_per_mode() {
        let mut store = store_with_pages(2);
        let second = page_id(&store, 1);
        store
            .dispatch(&EditorAction::SetPageImportMode { page_id: second, mode: Some(ImportMode::Box) })
            .expect("mode");
        store
            .dispatch(&EditorAction::ImportText { raw: "Page 1 - A: hi, B: yo Page 2 - A: bye, B: ok Page 9 - C: x".to_string() })
            .expect("import");

        let pages = &store.state().pages;
        assert_eq!(pages[0].text_objects.len(), 2);
        assert_eq!(pages[0].text_objects[1].original_text, "B: yo");
        assert_eq!(pages[1].text_objects.len(), 1);
        assert_eq!(pages[1].text_objects[0].original_text, "A: bye\nB: ok");
        // 自動配置済み: 2つ目は1つ目より下
        assert!(pages[0].text_objects[1].y > pages[0].text_objects[0].y);
    }

    #[test]
    fn selecting_text_clears_mask_and_vice_versa() {
        let mut store = store_with_pages(1);
        let pid = page_id(&store, 0);
        store.dispatch(&EditorAction::SelectPage { page_id: Some(pid.clone()) }).expect("select page");
        store.dispatch(&EditorAction::AddText { page_id: pid.clone(), text: "hi".to_string() }).expect("add");
        let text_id = store.state().pages[0].text_objects[0].id.clone();
        store.dispatch(&EditorAction::AddMask { page_id: pid.clone(), mask: mask("m1") }).expect("mask");
        assert_eq!(store.state().selected_mask_id.as_deref(), Some("m1"));

        store.dispatch(&EditorAction::SelectText { text_id: Some(text_id.clone()) }).expect("select text");
        assert_eq!(store.state().selected_text_id.as_deref(), Some(text_id.as_str()));
        assert!(store.state().selected_mask_id.is_none());

        store.dispatch(&EditorAction::SelectMask { mask_id: Some("m1".to_string()) }).expect("select mask");
        assert!(store.state().selected_text_id.is_none());
    }

    #[test]
    fn selection_must_belong_to_selected_page() {
        let mut store = store_with_pages(2);
        let first = page_id(&store, 0);
        let second = page_id(&store, 1);
        store.dispatch(&EditorAction::AddMask { page_id: second.clone(), mask: mask("m2") }).expect("mask");
        store.dispatch(&EditorAction::SelectPage { page_id: Some(first) }).expect("select page");

        assert!(matches!(
            store.dispatch(&EditorAction::SelectText { text_id: Some("gone".to_string()) }),
            Err(EditorError::TextNotFound(_))
        ));
        assert!(matches!(
            store.dispatch(&EditorAction::SelectMask { mask_id: Some("m2".to_string()) }),
            Err(EditorError::MaskNotFound(_))
        ));
        assert!(store.state().selected_mask_id.is_none());
        // 削除ショートカットは何も消さずに成功する
        store.dispatch(&EditorAction::DeleteSelected).expect("delete nothing");
        assert_eq!(store.state().pages[1].masks.len(), 1);

        store.dispatch(&EditorAction::SelectPage { page_id: Some(second) }).expect("select page");
        store.dispatch(&EditorAction::SelectMask { mask_id: Some("m2".to_string()) }).expect("select mask");
        store.dispatch(&EditorAction::SelectText { text_id: None }).expect("clear");
        assert_eq!(store.state().selected_mask_id.as_deref(), Some("m2"));
    }

    #[test]
    fn undo_relayouts_with_current_hide_labels() {
        let mut store = store_with_pages(1);
        let pid = page_id(&store, 0);
        let mut style = TextStyle::default();
        style.vertical_alignment = VerticalAlignment::Middle;
        store.dispatch(&EditorAction::SetGlobalStyle { style }).expect("style");
        store.dispatch(&EditorAction::SetImportMode { mode: ImportMode::Box }).expect("mode");
        // ラベル付きだと2行、ラベル無しだと1行になる長さ
        store.dispatch(&EditorAction::ImportText { raw: "Page 1 - Alexander Hamilton: hello there".to_string() }).expect("import");
        store.dispatch(&EditorAction::AddText { page_id: pid, text: "Narrator: later".to_string() }).expect("add");
        store.dispatch(&EditorAction::SetHideLabels { enabled: true }).expect("hide");
        assert!(store.undo());

        let state = store.state();
        let mut expected = state.pages[0].clone();
        let (width, height) = expected.preview_canvas(state.preview_width);
        layout_page(
            &mut expected,
            &state.global_style,
            Canvas { width, height },
            LAYOUT_GAP,
            state.hide_labels,
            &EstimatedMetrics,
        );
        let positions = |page: &Page| page.text_objects.iter().map(|t| (t.x, t.y)).collect::<Vec<_>>();
        assert_eq!(state.pages[0].text_objects.len(), 1);
        assert_eq!(positions(&state.pages[0]), positions(&expected));

        assert!(store.redo());
        assert_eq!(store.state().pages[0].text_objects.len(), 2);
        let state = store.state();
        let mut expected = state.pages[0].clone();
        let (width, height) = expected.preview_canvas(state.preview_width);
        layout_page(&mut expected, &state.global_style, Canvas { width, height }, LAYOUT_GAP, true, &EstimatedMetrics);
        assert_eq!(positions(&state.pages[0]), positions(&expected));
    }

    #[test]
    fn undo_redo_are_symmetric() {
        let mut store = store_with_pages(1);
        let pid = page_id(&store, 0);
        let before = store.state().pages.clone();

        let actions = vec![
            EditorAction::AddText { page_id: pid.clone(), text: "one".to_string() },
            EditorAction::AddText { page_id: pid.clone(), text: "two".to_string() },
            EditorAction::AddMask { page_id: pid.clone(), mask: mask("m1") },
        ];
        for action in &actions {
            store.dispatch(action).expect("dispatch");
        }
        let after = store.state().pages.clone();

        for _ in 0..actions.len() {
            assert!(store.undo());
        }
        assert_eq!(store.state().pages, before);

        for _ in 0..actions.len() {
            assert!(store.redo());
        }
        assert_eq!(store.state().pages, after);
    }

    #[test]
    fn new_action_after_undo_discards_redo() {
        let mut store = store_with_pages(1);
        let pid = page_id(&store, 0);
        store.dispatch(&EditorAction::AddText { page_id: pid.clone(), text: "one".to_string() }).expect("add");
        assert!(store.undo());
        assert!(store.can_redo());

        store.dispatch(&EditorAction::AddMask { page_id: pid, mask: mask("m1") }).expect("mask");
        assert!(!store.can_redo());
        assert!(!store.redo());
    }

    #[test]
    fn view_only_actions_are_not_recorded() {
        let mut store = store_with_pages(1);
        assert!(store.undo());
        assert!(!store.can_undo());

        store.dispatch(&EditorAction::SetGalleryView { enabled: false }).expect("gallery");
        store.dispatch(&EditorAction::SetImportMode { mode: ImportMode::Box }).expect("mode");
        store.dispatch(&EditorAction::DeleteSelected).expect("delete nothing");
        assert!(!store.can_undo());
    }

    #[test]
    fn delete_selected_removes_text_and_clears_selection() {
        let mut store = store_with_pages(1);
        let pid = page_id(&store, 0);
        store.dispatch(&EditorAction::SelectPage { page_id: Some(pid.clone()) }).expect("select");
        store.dispatch(&EditorAction::AddText { page_id: pid, text: "hello".to_string() }).expect("add");
        assert!(store.state().selected_text_id.is_some());

        store.dispatch(&EditorAction::DeleteSelected).expect("delete");
        assert!(store.state().pages[0].text_objects.is_empty());
        assert!(store.state().selected_text_id.is_none());

        assert!(store.undo());
        assert_eq!(store.state().pages[0].text_objects.len(), 1);
    }

    #[test]
    fn local_style_detaches_from_global() {
        let mut store = store_with_pages(2);
        let first = page_id(&store, 0);
        store.dispatch(&EditorAction::ImportText { raw: "Page 1 - A: a Page 2 - B: b".to_string() }).expect("import");
        store.dispatch(&EditorAction::ActivateLocalStyle { page_id: first.clone() }).expect("activate");
        assert_eq!(store.state().pages[0].local_style.as_ref(), Some(&store.state().global_style));

        let mut global = TextStyle::default();
        global.font_size = 40.0;
        store.dispatch(&EditorAction::SetGlobalStyle { style: global }).expect("global");

        let pages = &store.state().pages;
        assert_eq!(pages[0].text_objects[0].style.font_size, 24.0);
        assert_eq!(pages[1].text_objects[0].style.font_size, 40.0);

        store.dispatch(&EditorAction::ResetLocalStyle { page_id: first }).expect("reset");
        assert_eq!(store.state().pages[0].text_objects[0].style.font_size, 40.0);
        assert!(!store.state().pages[0].is_local_style);
    }

    #[test]
    fn invalid_style_is_rejected_without_state_change() {
        let mut store = store_with_pages(1);
        let before = store.state().clone();
        let mut style = TextStyle::default();
        style.padding.top = -5.0;
        assert!(store.dispatch(&EditorAction::SetGlobalStyle { style }).is_err());
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn manual_move_disables_auto_layout_until_requested() {
        let mut store = store_with_pages(1);
        let pid = page_id(&store, 0);
        store.dispatch(&EditorAction::ImportText { raw: "Page 1 - A: hi".to_string() }).expect("import");
        let text_id = store.state().pages[0].text_objects[0].id.clone();

        store
            .dispatch(&EditorAction::MoveText { page_id: pid.clone(), text_id: text_id.clone(), x: 150.0, y: 42.0 })
            .expect("move");
        let object = &store.state().pages[0].text_objects[0];
        assert_eq!((object.x, object.y), (100.0, 42.0));
        assert!(!store.state().pages[0].auto_layout);

        store.dispatch(&EditorAction::EditText { page_id: pid.clone(), text_id, text: "A: longer".to_string() }).expect("edit");
        assert_eq!(store.state().pages[0].text_objects[0].y, 42.0);

        store.dispatch(&EditorAction::AutoLayout { page_id: pid }).expect("layout");
        assert!(store.state().pages[0].auto_layout);
        assert_ne!(store.state().pages[0].text_objects[0].y, 42.0);
    }

    #[test]
    fn action_json_uses_tagged_camel_case() {
        let action: EditorAction =
            serde_json::from_str(r#"{"type":"moveText","pageId":"p","textId":"t","x":1.0,"y":2.0}"#)
                .expect("parse");
        assert!(matches!(action, EditorAction::MoveText { .. }));
    }
}
