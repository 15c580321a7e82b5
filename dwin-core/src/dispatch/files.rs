//! File browser and print start
//!
//! The listing itself belongs to the media collaborator. The browser only
//! remembers which page of [`FILES_PER_PAGE`] names is shown and which file
//! was picked; slot indices from the panel are relative to that page.

use dwin_protocol::{CommandEncoder, CommandError};

use super::{Disposition, Dispatcher};
use crate::event::{EventKey, FilePageAction};
use crate::fields::{self, vp, FILES_PER_PAGE, TEXT_FIELD_WIDTH};
use crate::state::{PageId, PopupContext, PopupKind};
use crate::traits::{FileName, Printer};

/// Paging position in the media listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FileBrowser {
    page: u16,
    selected: Option<usize>,
}

impl FileBrowser {
    /// Current page, 0-based
    pub fn page(&self) -> u16 {
        self.page
    }

    /// Listing index of the picked file
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Pages needed for `total` files; an empty listing still has one page
    pub fn page_count(total: usize) -> u16 {
        let per_page = FILES_PER_PAGE as usize;
        total.div_ceil(per_page).clamp(1, u16::MAX as usize) as u16
    }

    /// Listing index of a 1-based slot on the current page
    pub fn absolute_index(&self, slot: u16) -> usize {
        self.page as usize * FILES_PER_PAGE as usize + slot.saturating_sub(1) as usize
    }

    fn reset(&mut self) {
        self.page = 0;
        self.selected = None;
    }
}

impl Dispatcher {
    fn no_media(&mut self, out: &mut CommandEncoder) -> Result<Disposition, CommandError> {
        self.files.reset();
        self.open_popup(PopupContext::notice(PopupKind::NoMedia), None, out)?;
        Ok(Disposition::Accepted)
    }

    pub(super) fn open_file_list<P: Printer + ?Sized>(
        &mut self,
        printer: &mut P,
        out: &mut CommandEncoder,
    ) -> Result<Disposition, CommandError> {
        if !printer.is_mounted() {
            return self.no_media(out);
        }
        self.files.reset();
        self.draw_file_page(printer.list(), out)?;
        self.show_page(PageId::FileList, out)?;
        Ok(Disposition::Accepted)
    }

    /// Write every slot of the current page, blanking slots past the end
    fn draw_file_page(
        &self,
        listing: &[FileName],
        out: &mut CommandEncoder,
    ) -> Result<(), CommandError> {
        for slot in 0..FILES_PER_PAGE {
            let name = listing
                .get(self.files.absolute_index(slot + 1))
                .map(|n| n.as_str())
                .unwrap_or("");
            out.write_text(fields::file_slot(slot), name, TEXT_FIELD_WIDTH)?;
        }
        out.write_word(vp::FILE_PAGE_NUMBER, self.files.page + 1)?;
        out.write_word(vp::FILE_PAGE_COUNT, FileBrowser::page_count(listing.len()))
    }

    pub(super) fn turn_file_page<P: Printer + ?Sized>(
        &mut self,
        action: FilePageAction,
        printer: &mut P,
        out: &mut CommandEncoder,
    ) -> Result<Disposition, CommandError> {
        if !printer.is_mounted() {
            return self.no_media(out);
        }
        let last = FileBrowser::page_count(printer.list().len()) - 1;
        let page = match action {
            FilePageAction::Next if self.files.page < last => self.files.page + 1,
            FilePageAction::Previous if self.files.page > 0 => self.files.page - 1,
            FilePageAction::Refresh => self.files.page.min(last),
            _ => return Ok(Disposition::Ignored),
        };
        self.files.page = page;
        self.draw_file_page(printer.list(), out)?;
        Ok(Disposition::Accepted)
    }

    pub(super) fn select_file<P: Printer + ?Sized>(
        &mut self,
        slot: u16,
        printer: &mut P,
        out: &mut CommandEncoder,
    ) -> Result<Disposition, CommandError> {
        let index = self.files.absolute_index(slot);
        let Some(name) = printer.list().get(index).cloned() else {
            debug!("file slot {=u16} is empty", slot);
            return Ok(Disposition::Ignored);
        };

        printer.select(index);
        self.files.selected = Some(index);
        out.write_text(vp::SELECTED_FILE_NAME, &name, TEXT_FIELD_WIDTH)?;

        let popup = PopupContext::new(
            PopupKind::StartPrint,
            EventKey::StartPrintJob,
            EventKey::Dismiss,
        );
        self.open_popup(popup, None, out)?;
        Ok(Disposition::Accepted)
    }

    pub(super) fn start_print<P: Printer + ?Sized>(
        &mut self,
        printer: &mut P,
        out: &mut CommandEncoder,
    ) -> Result<Disposition, CommandError> {
        if printer.state().is_active() {
            return Ok(Disposition::Ignored);
        }
        let name = match self.files.selected {
            Some(index) if printer.is_mounted() => printer.list().get(index).cloned(),
            _ => None,
        };
        let Some(name) = name else {
            return self.no_media(out);
        };

        printer.synchronize();
        if let Err(e) = printer.open_and_print(&name) {
            warn!("cannot open file: {:?}", e);
            self.open_popup(PopupContext::notice(PopupKind::MediaError), None, out)?;
            return Ok(Disposition::Accepted);
        }
        printer.start();
        info!("print started");

        self.request_immediate();
        self.redraw_all();
        out.write_text(vp::PRINTING_FILE_NAME, &name, TEXT_FIELD_WIDTH)?;
        self.show_page(PageId::Printing, out)?;
        Ok(Disposition::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::InterpretedValue;
    use crate::testing::{Call, FakePrinter};
    use crate::traits::JobState;

    fn ready(files: usize) -> (Dispatcher, FakePrinter, CommandEncoder) {
        let mut dispatcher = Dispatcher::default();
        let mut out = CommandEncoder::new();
        dispatcher.enter_main(&mut out);
        out.clear();
        (dispatcher, FakePrinter::with_files(files), out)
    }

    fn select(
        d: &mut Dispatcher,
        printer: &mut FakePrinter,
        out: &mut CommandEncoder,
        slot: u16,
    ) -> Disposition {
        d.dispatch(EventKey::SelectFile, InterpretedValue::Index(slot), printer, out)
    }

    #[test]
    fn test_page_count() {
        assert_eq!(FileBrowser::page_count(0), 1);
        assert_eq!(FileBrowser::page_count(20), 1);
        assert_eq!(FileBrowser::page_count(21), 2);
    }

    #[test]
    fn test_select_past_listing_is_ignored() {
        let (mut d, mut printer, mut out) = ready(2);
        let before = d.state().clone();

        assert_eq!(select(&mut d, &mut printer, &mut out, 3), Disposition::Ignored);
        assert_eq!(d.state(), &before);
        assert_eq!(d.files().selected(), None);
        assert!(printer.calls.is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn test_select_offers_start() {
        let (mut d, mut printer, mut out) = ready(2);
        assert_eq!(select(&mut d, &mut printer, &mut out, 2), Disposition::Accepted);
        assert_eq!(printer.calls, [Call::Select(1)]);
        assert_eq!(d.state().popup().map(|p| p.kind), Some(PopupKind::StartPrint));

        let name = out.pop().unwrap();
        assert_eq!(name.address, vp::SELECTED_FILE_NAME);
        assert!(name.payload.starts_with(b"file1.gcode\0"));
    }

    #[test]
    fn test_confirm_starts_print() {
        let (mut d, mut printer, mut out) = ready(2);
        select(&mut d, &mut printer, &mut out, 1);
        d.dispatch(EventKey::ConfirmPopup, InterpretedValue::None, &mut printer, &mut out);

        assert_eq!(
            printer.calls,
            [
                Call::Select(0),
                Call::Synchronize,
                Call::OpenAndPrint("file0.gcode".into()),
                Call::Start
            ]
        );
        assert_eq!(printer.job, JobState::Printing);
        assert_eq!(d.state().page(), PageId::Printing);
        assert!(d.take_refresh().immediate);
    }

    #[test]
    fn test_start_without_media_raises_popup() {
        let (mut d, mut printer, mut out) = ready(2);
        select(&mut d, &mut printer, &mut out, 1);
        printer.mounted = false;
        d.dispatch(EventKey::ConfirmPopup, InterpretedValue::None, &mut printer, &mut out);

        assert_eq!(d.state().popup().map(|p| p.kind), Some(PopupKind::NoMedia));
        assert!(!printer.called(&Call::Start));
    }

    #[test]
    fn test_open_failure_raises_popup() {
        let (mut d, mut printer, mut out) = ready(1);
        printer.open_fails = true;
        select(&mut d, &mut printer, &mut out, 1);
        d.dispatch(EventKey::ConfirmPopup, InterpretedValue::None, &mut printer, &mut out);

        assert_eq!(d.state().popup().map(|p| p.kind), Some(PopupKind::MediaError));
        assert_eq!(printer.job, JobState::Idle);
    }

    #[test]
    fn test_file_list_needs_media() {
        let (mut d, mut printer, mut out) = ready(0);
        printer.mounted = false;
        d.dispatch(EventKey::OpenPage, InterpretedValue::Index(1), &mut printer, &mut out);
        assert_eq!(d.state().popup().map(|p| p.kind), Some(PopupKind::NoMedia));
        assert_eq!(d.state().page(), PageId::Main);
    }

    #[test]
    fn test_file_list_draws_every_slot() {
        let (mut d, mut printer, mut out) = ready(3);
        d.dispatch(EventKey::OpenPage, InterpretedValue::Index(1), &mut printer, &mut out);

        let frames: std::vec::Vec<_> = core::iter::from_fn(|| out.pop()).collect();
        // 20 slots, page number, page count, page switch
        assert_eq!(frames.len(), FILES_PER_PAGE as usize + 3);
        assert!(frames[2].payload.starts_with(b"file2.gcode\0"));
        assert!(frames[3].payload.iter().all(|&b| b == 0));
        assert_eq!(frames[20].payload.as_slice(), &[0x00, 0x01]);
        assert_eq!(frames[21].payload.as_slice(), &[0x00, 0x01]);
        assert_eq!(d.state().page(), PageId::FileList);
    }

    #[test]
    fn test_paging_offsets_slots() {
        let (mut d, mut printer, mut out) = ready(25);
        d.dispatch(EventKey::OpenPage, InterpretedValue::Index(1), &mut printer, &mut out);
        out.clear();

        let next = InterpretedValue::Index(1);
        assert_eq!(d.dispatch(EventKey::FilePage, next, &mut printer, &mut out), Disposition::Accepted);
        assert_eq!(d.files().page(), 1);
        assert_eq!(d.dispatch(EventKey::FilePage, next, &mut printer, &mut out), Disposition::Ignored);

        out.clear();
        assert_eq!(select(&mut d, &mut printer, &mut out, 5), Disposition::Accepted);
        assert_eq!(printer.calls, [Call::Select(24)]);
        assert_eq!(
            select(&mut d, &mut printer, &mut out, 6),
            Disposition::Dropped(crate::state::DropReason::PopupOpen)
        );
    }
}
