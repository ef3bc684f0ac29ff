use crate::cache::{CachedRecord, Filter, RecordCache, RecordKey};
use crate::error::{CONFIGURATION_MESSAGE, CmsError, Result};
use crate::record::RecordForm;
use crate::render::{
    self, CardView, DELETE_CONFIRMATION, ModalView, NoticeView, OptionView, PageView,
};
use crate::sheet::{SheetAdapter, SheetTransport};
use log::{error, info};
use serde::{Deserialize, Serialize};

const SAVE_FAILED: &str = "Error saving component. Please try again.";
const DELETE_FAILED: &str = "Error deleting component. Please try again.";

/// Where the single modal dialog is, as seen from outside
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Creating,
    Editing(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Modal {
    Closed,
    Creating,
    Editing(RecordKey),
}

/// How the user dismissed the modal. All of them discard the form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    #[default]
    Cancel,
    CloseButton,
    OutsideClick,
    Escape,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

/// Drives the grid and the create/edit/delete modal over one record cache
pub struct Controller<T> {
    adapter: SheetAdapter<T>,
    cache: RecordCache,
    filter: Filter,
    modal: Modal,
    form: RecordForm,
    pending_delete: bool,
    notices: Vec<Notice>,
}

impl<T: SheetTransport> Controller<T> {
    pub fn new(adapter: SheetAdapter<T>) -> Self {
        Controller {
            adapter,
            cache: RecordCache::new(),
            filter: Filter::default(),
            modal: Modal::Closed,
            form: RecordForm::default(),
            pending_delete: false,
            notices: Vec::new(),
        }
    }

    pub fn adapter(&self) -> &SheetAdapter<T> {
        &self.adapter
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    pub fn form(&self) -> &RecordForm {
        &self.form
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn delete_pending(&self) -> bool {
        self.pending_delete
    }

    pub fn state(&self) -> ModalState {
        match self.modal {
            Modal::Closed => ModalState::Closed,
            Modal::Creating => ModalState::Creating,
            Modal::Editing(key) => match self.cache.position_of(key) {
                Some(position) => ModalState::Editing(position),
                None => ModalState::Closed,
            },
        }
    }

    fn notify(&mut self, kind: NoticeKind, text: &str) {
        self.notices.push(Notice {
            kind,
            text: text.to_string(),
        });
    }

    fn fail(&mut self, context: &str, err: &CmsError, fallback: &'static str) {
        error!("{}: {}", context, err);
        self.notify(NoticeKind::Error, err.user_message(fallback));
    }

    /// Initial population of the cache
    pub async fn start(&mut self) -> Result<()> {
        match self.adapter.load_all().await {
            Ok(contents) => {
                self.cache.replace_all(contents);
                Ok(())
            }
            Err(err) => {
                self.fail("error initializing app", &err, CONFIGURATION_MESSAGE);
                Err(err)
            }
        }
    }

    /// Reload everything from the store; the old list survives a failure
    pub async fn refresh(&mut self) -> Result<()> {
        match self.adapter.load_all().await {
            Ok(contents) => {
                self.cache.replace_all(contents);
                // positions were re-derived, an open edit no longer points anywhere
                self.reset_modal();
                self.notify(NoticeKind::Success, "Components refreshed successfully!");
                Ok(())
            }
            Err(err) => {
                self.fail("error refreshing components", &err, CONFIGURATION_MESSAGE);
                Err(err)
            }
        }
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    /// The current filtered view with each record's true position
    pub fn filtered(&self) -> Vec<(usize, &CachedRecord)> {
        self.cache
            .iter()
            .enumerate()
            .filter(|(_, entry)| self.filter.matches(&entry.record))
            .collect()
    }

    pub fn open_create(&mut self) {
        self.modal = Modal::Creating;
        self.form = RecordForm::default();
        self.pending_delete = false;
    }

    pub fn open_edit(&mut self, position: usize) -> Result<()> {
        let entry = self.cache.get(position).ok_or(CmsError::InvalidPosition {
            position,
            len: self.cache.len(),
        })?;
        self.form = RecordForm::from_record(&entry.record);
        self.modal = Modal::Editing(entry.key);
        self.pending_delete = false;
        Ok(())
    }

    /// Open the record a card (or any filtered view) handed out
    pub fn open_edit_key(&mut self, key: RecordKey) -> Result<()> {
        let position = self
            .cache
            .position_of(key)
            .ok_or(CmsError::InvalidState("record is no longer cached"))?;
        self.open_edit(position)
    }

    pub fn close(&mut self, reason: CloseReason) {
        if self.modal != Modal::Closed {
            info!("closing modal ({:?})", reason);
        }
        self.reset_modal();
    }

    fn reset_modal(&mut self) {
        self.modal = Modal::Closed;
        self.form = RecordForm::default();
        self.pending_delete = false;
    }

    /// Current position and sheet row of the record being edited
    fn editing_target(&self, key: RecordKey) -> Result<(usize, usize)> {
        self.cache
            .position_of(key)
            .and_then(|position| self.cache.get(position).map(|entry| (position, entry.row)))
            .ok_or(CmsError::InvalidState("edited record is no longer cached"))
    }

    /// Persist the form: append when creating, overwrite when editing
    pub async fn submit(&mut self, form: RecordForm) -> Result<()> {
        let target = match self.modal {
            Modal::Closed => return Err(CmsError::InvalidState("no component form is open")),
            Modal::Creating => None,
            Modal::Editing(key) => Some(self.editing_target(key)?),
        };
        let record = form.to_record();
        // keep what the user typed in case the write fails
        self.form = form;

        match target {
            None => {
                let row = self.cache.next_row();
                match self.adapter.append(row, &record).await {
                    Ok(stored) => {
                        info!("created component '{}' on row {}", stored.name, row);
                        self.cache.push(row, stored);
                        self.reset_modal();
                        self.notify(NoticeKind::Success, "Component created successfully!");
                        Ok(())
                    }
                    Err(err) => {
                        self.fail("error saving component", &err, SAVE_FAILED);
                        Err(err)
                    }
                }
            }
            Some((position, row)) => {
                match self.adapter.update(row, &record).await {
                    Ok(stored) => {
                        info!("updated component '{}' on row {}", stored.name, row);
                        self.cache.set(position, stored)?;
                        self.reset_modal();
                        self.notify(NoticeKind::Success, "Component updated successfully!");
                        Ok(())
                    }
                    Err(err) => {
                        self.fail("error saving component", &err, SAVE_FAILED);
                        Err(err)
                    }
                }
            }
        }
    }

    /// First step of a delete: ask for confirmation
    pub fn request_delete(&mut self) -> Result<()> {
        match self.modal {
            Modal::Editing(_) => {
                self.pending_delete = true;
                Ok(())
            }
            _ => Err(CmsError::InvalidState("only an edited component can be deleted")),
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = false;
    }

    pub async fn confirm_delete(&mut self) -> Result<()> {
        let key = match self.modal {
            Modal::Editing(key) if self.pending_delete => key,
            Modal::Editing(_) => return Err(CmsError::InvalidState("delete was not requested")),
            _ => return Err(CmsError::InvalidState("only an edited component can be deleted")),
        };
        let (position, row) = self.editing_target(key)?;

        match self.adapter.clear(row).await {
            Ok(()) => {
                let removed = self.cache.remove(position)?;
                info!("deleted component '{}' from row {}", removed.name, row);
                self.reset_modal();
                self.notify(NoticeKind::Success, "Component deleted successfully!");
                Ok(())
            }
            Err(err) => {
                self.pending_delete = false;
                self.fail("error deleting component", &err, DELETE_FAILED);
                Err(err)
            }
        }
    }

    /// Record a failure raised outside the controller (e.g. a rejected request)
    pub fn report(&mut self, err: &CmsError, fallback: &'static str) {
        self.fail("request rejected", err, fallback);
    }

    fn modal_view(&self) -> Option<ModalView> {
        let (title, show_delete) = match self.modal {
            Modal::Closed => return None,
            Modal::Creating => ("Add New Component", false),
            Modal::Editing(_) => ("Edit Component", true),
        };
        Some(ModalView {
            title,
            show_delete,
            confirm_delete: self.pending_delete,
            confirm_text: DELETE_CONFIRMATION,
            form: self.form.clone(),
            statuses: render::status_options(Some(self.form.status.as_str())),
        })
    }

    /// Just the cards of the current filtered view
    pub fn render_grid(&self) -> Result<String> {
        let cards: Vec<CardView> = self
            .filtered()
            .into_iter()
            .map(|(position, entry)| CardView::new(position, entry))
            .collect();
        render::render_grid(&cards)
    }

    /// Whole page; pending notices are shown once and dropped
    pub fn render(&mut self) -> Result<String> {
        let grid = self.render_grid()?;
        let modal = match self.modal_view() {
            Some(view) => render::render_modal(&view)?,
            None => String::new(),
        };

        let selected_category = self.filter.category.as_deref();
        let categories = self
            .cache
            .categories()
            .into_iter()
            .map(|c| OptionView {
                value: c.to_string(),
                selected: selected_category == Some(c),
            })
            .collect();

        let notices = self
            .notices
            .drain(..)
            .map(|n| NoticeView {
                kind: match n.kind {
                    NoticeKind::Success => "success",
                    NoticeKind::Error => "error",
                },
                text: n.text,
            })
            .collect();

        let page = PageView {
            notices,
            categories,
            statuses: render::status_options(self.filter.status.map(|s| s.as_str())),
            search: self.filter.search.clone(),
            grid,
            modal,
        };
        render::render_page(&page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SheetConfig;
    use crate::record::{COLUMNS, Status};
    use crate::sheet::MemorySheet;

    fn config() -> SheetConfig {
        SheetConfig {
            api_key: "key".to_string(),
            sheet_id: "sheet".to_string(),
            ..SheetConfig::default()
        }
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sheet() -> MemorySheet {
        MemorySheet::with_rows(vec![
            COLUMNS.iter().map(|h| h.to_string()).collect(),
            row(&["Button", "", "Input", "Approved", "Use for actions"]),
            row(&["Modal", "", "Overlay", "Draft", "Use sparingly"]),
        ])
    }

    async fn started() -> Controller<MemorySheet> {
        let adapter = SheetAdapter::new(sheet(), config()).with_clock(|| "2024-06-01".to_string());
        let mut controller = Controller::new(adapter);
        controller.start().await.unwrap();
        controller
    }

    fn form(name: &str) -> RecordForm {
        RecordForm {
            name: name.to_string(),
            category: "Input".to_string(),
            ..RecordForm::default()
        }
    }

    #[tokio::test]
    async fn start_without_configuration_shows_instructions() {
        let adapter = SheetAdapter::new(sheet(), SheetConfig::default());
        let mut controller = Controller::new(adapter);

        assert!(controller.start().await.unwrap_err().is_configuration());
        assert_eq!(controller.notices()[0].text, CONFIGURATION_MESSAGE);

        let html = controller.render().unwrap();
        assert!(html.contains("No components found"));
        assert!(html.contains("Please check your API configuration"));
        assert!(controller.notices().is_empty());
    }

    #[tokio::test]
    async fn create_appends_and_closes() {
        let mut controller = started().await;
        controller.open_create();
        assert_eq!(controller.state(), ModalState::Creating);
        assert_eq!(controller.form().status, "Draft");

        controller.submit(form("Chip")).await.unwrap();

        assert_eq!(controller.state(), ModalState::Closed);
        assert_eq!(controller.cache().len(), 3);
        let chip = &controller.cache().get(2).unwrap().record;
        assert_eq!(chip.last_updated, "2024-06-01");
        assert_eq!(controller.adapter().transport().row(4)[0], "Chip");
        assert_eq!(
            controller.notices().last().map(|n| n.text.as_str()),
            Some("Component created successfully!")
        );
    }

    #[tokio::test]
    async fn failed_save_keeps_the_modal_and_form() {
        let mut controller = started().await;
        controller.open_create();
        controller.adapter().transport().fail_next(500);

        let err = controller.submit(form("Chip")).await.unwrap_err();
        assert!(matches!(err, CmsError::Transport { status: 500, .. }));
        assert_eq!(controller.state(), ModalState::Creating);
        assert_eq!(controller.form().name, "Chip");
        assert_eq!(controller.cache().len(), 2);
        assert_eq!(controller.notices().last().unwrap().kind, NoticeKind::Error);

        // manual retry goes through
        let retry = controller.form().clone();
        controller.submit(retry).await.unwrap();
        assert_eq!(controller.cache().len(), 3);
    }

    #[tokio::test]
    async fn edit_from_a_filtered_view_targets_the_true_row() {
        let mut controller = started().await;
        controller.set_filter(Filter::new(Some("Overlay"), None, ""));
        let (position, entry) = controller.filtered()[0];
        assert_eq!(position, 1);
        let key = entry.key;

        controller.open_edit_key(key).unwrap();
        assert_eq!(controller.state(), ModalState::Editing(1));
        assert_eq!(controller.form().name, "Modal");

        let mut edited = controller.form().clone();
        edited.status = Status::Review.as_str().to_string();
        controller.submit(edited).await.unwrap();

        assert_eq!(controller.adapter().transport().row(3)[3], "Review");
        assert_eq!(controller.adapter().transport().row(2)[3], "Approved");
        assert_eq!(controller.cache().get(1).unwrap().record.status, "Review");
        assert_eq!(controller.cache().get(1).unwrap().key, key);
    }

    #[tokio::test]
    async fn delete_needs_confirmation() {
        let mut controller = started().await;
        controller.open_edit(0).unwrap();

        assert!(controller.confirm_delete().await.is_err());
        assert!(controller.adapter().transport().calls().iter().all(|c| !c.starts_with("CLEAR")));

        controller.request_delete().unwrap();
        controller.cancel_delete();
        assert!(!controller.delete_pending());

        controller.request_delete().unwrap();
        controller.confirm_delete().await.unwrap();

        assert_eq!(controller.state(), ModalState::Closed);
        assert_eq!(controller.cache().len(), 1);
        assert_eq!(controller.cache().get(0).unwrap().record.name, "Modal");
        assert!(controller.adapter().transport().row(2).iter().all(String::is_empty));
    }

    async fn three_rows() -> Controller<MemorySheet> {
        let sheet = MemorySheet::with_rows(vec![
            COLUMNS.iter().map(|h| h.to_string()).collect(),
            row(&["Button", "", "Input"]),
            row(&["Modal", "", "Overlay"]),
            row(&["Tabs", "", "Navigation"]),
        ]);
        let mut controller = Controller::new(SheetAdapter::new(sheet, config()));
        controller.start().await.unwrap();
        controller
    }

    async fn delete_at(controller: &mut Controller<MemorySheet>, position: usize) {
        controller.open_edit(position).unwrap();
        controller.request_delete().unwrap();
        controller.confirm_delete().await.unwrap();
    }

    fn names(controller: &Controller<MemorySheet>) -> Vec<String> {
        controller
            .cache()
            .iter()
            .map(|entry| entry.record.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn create_after_delete_goes_past_the_last_row() {
        let mut controller = three_rows().await;
        delete_at(&mut controller, 0).await;

        controller.open_create();
        controller.submit(form("Chip")).await.unwrap();

        assert_eq!(controller.adapter().transport().row(4)[0], "Tabs");
        assert_eq!(controller.adapter().transport().row(5)[0], "Chip");

        controller.refresh().await.unwrap();
        assert_eq!(names(&controller), vec!["Modal", "Tabs", "Chip"]);
    }

    #[tokio::test]
    async fn edit_after_delete_writes_the_records_own_row() {
        let mut controller = three_rows().await;
        delete_at(&mut controller, 0).await;

        controller.open_edit(0).unwrap();
        let mut edited = controller.form().clone();
        assert_eq!(edited.name, "Modal");
        edited.name = "Modal v2".to_string();
        controller.submit(edited).await.unwrap();

        assert!(controller.adapter().transport().row(2).iter().all(String::is_empty));
        assert_eq!(controller.adapter().transport().row(3)[0], "Modal v2");

        controller.refresh().await.unwrap();
        assert_eq!(names(&controller), vec!["Modal v2", "Tabs"]);

        // positions after a reload skip the blank row but rows do not
        delete_at(&mut controller, 1).await;
        assert!(controller.adapter().transport().row(4).iter().all(String::is_empty));
        assert_eq!(controller.adapter().transport().row(3)[0], "Modal v2");
    }

    #[tokio::test]
    async fn delete_is_not_offered_while_creating() {
        let mut controller = started().await;
        controller.open_create();
        assert!(matches!(
            controller.request_delete(),
            Err(CmsError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn close_discards_the_form() {
        let mut controller = started().await;
        controller.open_edit(1).unwrap();
        controller.close(CloseReason::Escape);

        assert_eq!(controller.state(), ModalState::Closed);
        assert_eq!(controller.form(), &RecordForm::default());
        assert!(matches!(
            controller.submit(form("Late")).await,
            Err(CmsError::InvalidState(_))
        ));
        assert!(controller.adapter().transport().calls().iter().all(|c| !c.starts_with("PUT")));
    }

    #[tokio::test]
    async fn nameless_create_disappears_on_reload() {
        let mut controller = started().await;
        controller.open_create();
        controller.submit(form("")).await.unwrap();
        assert_eq!(controller.cache().len(), 3);

        controller.refresh().await.unwrap();
        assert_eq!(controller.cache().len(), 2);
    }

    #[tokio::test]
    async fn render_shows_cards_modal_and_notices_once() {
        let mut controller = started().await;
        controller.open_edit(0).unwrap();
        controller.request_delete().unwrap();

        let html = controller.render().unwrap();
        assert!(html.contains("Edit Component"));
        assert!(html.contains("deleteBtn"));
        assert!(html.contains(DELETE_CONFIRMATION));
        assert!(html.contains("status-badge approved"));

        controller.close(CloseReason::Cancel);
        controller.set_filter(Filter::new(None, None, "nothing matches this"));
        let html = controller.render().unwrap();
        assert!(!html.contains("componentModal"));
        assert!(html.contains("No components found"));
    }
}
