use std::path::Path;
use std::sync::Arc;

use ksni::menu::{StandardItem, SubMenu};
use ksni::{MenuItem, ToolTip};
use tokio::sync::Notify;
use tracing::debug;

use super::{EntryStatus, EntryView, TrayPresenter};
use crate::hypervisor::Hypervisor;
use crate::models::BulkAction;

const TITLE: &str = "Virtray";

/// StatusNotifierItem exposing one submenu per configured domain.
pub struct VirtTray<H: Hypervisor> {
    presenter: TrayPresenter<H>,
    icon_name: String,
    quit: Arc<Notify>,
}

impl<H: Hypervisor> VirtTray<H> {
    pub fn new(presenter: TrayPresenter<H>, icon_name: String, quit: Arc<Notify>) -> Self {
        Self {
            presenter,
            icon_name,
            quit,
        }
    }

    fn entry_menu(view: &EntryView) -> MenuItem<Self> {
        let submenu: Vec<MenuItem<Self>> = match &view.status {
            // A single greyed-out line tells the user why the domain is unusable.
            EntryStatus::Disabled(reason) => vec![StandardItem {
                label: reason.clone(),
                enabled: false,
                ..Default::default()
            }
            .into()],
            EntryStatus::Ready(_) => view
                .actions
                .iter()
                .map(|action_view| {
                    let index = view.index;
                    let action = action_view.action;
                    StandardItem {
                        label: action.label().into(),
                        enabled: action_view.enabled,
                        activate: Box::new(move |tray: &mut Self| {
                            tray.presenter.trigger(index, action)
                        }),
                        ..Default::default()
                    }
                    .into()
                })
                .collect(),
        };

        // The configured icon is a file when one exists, otherwise a theme icon name.
        let (icon_name, icon_data) = if Path::new(&view.icon).is_file() {
            match std::fs::read(&view.icon) {
                Ok(data) => (String::new(), data),
                Err(e) => {
                    debug!(icon = %view.icon, "Cannot read icon: {}", e);
                    (String::new(), Vec::new())
                }
            }
        } else {
            (view.icon.clone(), Vec::new())
        };

        SubMenu {
            label: view.label(),
            icon_name,
            icon_data,
            submenu,
            ..Default::default()
        }
        .into()
    }

    fn bulk_item(bulk: BulkAction) -> MenuItem<Self> {
        StandardItem {
            label: bulk.label().into(),
            activate: Box::new(move |tray: &mut Self| tray.presenter.trigger_all(bulk)),
            ..Default::default()
        }
        .into()
    }
}

impl<H: Hypervisor> ksni::Tray for VirtTray<H> {
    const MENU_ON_ACTIVATE: bool = true;

    fn id(&self) -> String {
        env!("CARGO_PKG_NAME").into()
    }

    fn title(&self) -> String {
        TITLE.into()
    }

    fn icon_name(&self) -> String {
        self.icon_name.clone()
    }

    // Answered from configuration alone; hovering must not hit the daemon.
    fn tool_tip(&self) -> ToolTip {
        ToolTip {
            title: TITLE.into(),
            description: format!("{} domains configured", self.presenter.domain_count()),
            ..Default::default()
        }
    }

    // Overriding this, even empty, makes ksni rebuild the menu each time it opens.
    fn menu_about_to_show(&mut self) {}

    fn menu(&self) -> Vec<MenuItem<Self>> {
        let mut items: Vec<MenuItem<Self>> =
            self.presenter.render().iter().map(Self::entry_menu).collect();

        items.push(MenuItem::Separator);
        items.push(Self::bulk_item(BulkAction::SaveAll));
        items.push(Self::bulk_item(BulkAction::RestoreAll));
        items.push(MenuItem::Separator);
        items.push(
            StandardItem {
                label: "Quit".into(),
                icon_name: "application-exit".into(),
                activate: Box::new(|tray: &mut Self| tray.quit.notify_one()),
                ..Default::default()
            }
            .into(),
        );
        items
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use ksni::Tray;

    use super::*;
    use crate::hypervisor::fake::FakeHypervisor;
    use crate::models::{Action, PowerState, VmState};
    use crate::tray::tests::presenter;

    type FakeTray = VirtTray<FakeHypervisor>;

    fn tray(fake: &FakeHypervisor, configured: &[(&str, &str)]) -> (FakeTray, Arc<Notify>) {
        let (presenter, _) = presenter(fake, configured);
        let quit = Arc::new(Notify::new());
        let tray = VirtTray::new(presenter, "virt-manager".to_string(), quit.clone());
        (tray, quit)
    }

    fn submenu(item: &MenuItem<FakeTray>) -> &SubMenu<FakeTray> {
        match item {
            MenuItem::SubMenu(submenu) => submenu,
            _ => panic!("expected a submenu"),
        }
    }

    fn standard(item: &MenuItem<FakeTray>) -> &StandardItem<FakeTray> {
        match item {
            MenuItem::Standard(standard) => standard,
            _ => panic!("expected a standard item"),
        }
    }

    #[test]
    fn disabled_entry_shows_its_reason() {
        let fake = FakeHypervisor::with_domains(&[]);
        let (tray, _) = tray(&fake, &[("db1", "computer")]);

        let menu = tray.menu();
        let entry = submenu(&menu[0]);
        assert_eq!(entry.label, "db1 (unavailable)");
        assert_eq!(entry.submenu.len(), 1);
        let reason = standard(&entry.submenu[0]);
        assert!(reason.label.contains("db1"));
        assert!(!reason.enabled);
    }

    #[test]
    fn action_items_follow_domain_state() {
        let fake = FakeHypervisor::with_domains(&[("web1", PowerState::Running)]);
        let (tray, _) = tray(&fake, &[("web1", "computer")]);

        let menu = tray.menu();
        let entry = submenu(&menu[0]);
        assert_eq!(entry.label, "web1 (running)");
        let items: Vec<(String, bool)> = entry
            .submenu
            .iter()
            .map(standard)
            .map(|item| (item.label.clone(), item.enabled))
            .collect();
        let expected: Vec<(String, bool)> = Action::ALL
            .iter()
            .map(|&action| (action.label().to_string(), VmState::Running.allows(action)))
            .collect();
        assert_eq!(items, expected);
    }

    #[test]
    fn menu_ends_with_bulk_items_and_quit() {
        let fake = FakeHypervisor::with_domains(&[("web1", PowerState::ShutOff)]);
        let (tray, _) = tray(&fake, &[("web1", "computer")]);

        let menu = tray.menu();
        assert_eq!(menu.len(), 6);
        assert!(matches!(menu[1], MenuItem::Separator));
        assert_eq!(standard(&menu[2]).label, "Save All");
        assert_eq!(standard(&menu[3]).label, "Restore All");
        assert!(matches!(menu[4], MenuItem::Separator));
        assert_eq!(standard(&menu[5]).label, "Quit");
    }

    #[tokio::test]
    async fn quit_wakes_the_main_task() {
        let fake = FakeHypervisor::with_domains(&[]);
        let (mut tray, quit) = tray(&fake, &[]);

        let menu = tray.menu();
        let quit_item = standard(menu.last().unwrap());
        (quit_item.activate)(&mut tray);

        tokio::time::timeout(std::time::Duration::from_secs(1), quit.notified())
            .await
            .expect("quit was not signalled");
    }

    #[test]
    fn activating_an_action_reaches_the_daemon() {
        let fake = FakeHypervisor::with_domains(&[("web1", PowerState::ShutOff)]);
        let (mut tray, _) = tray(&fake, &[("web1", "computer")]);

        let menu = tray.menu();
        let start = standard(&submenu(&menu[0]).submenu[0]);
        assert_eq!(start.label, "Start");
        (start.activate)(&mut tray);
        assert_eq!(fake.power("web1"), Some(PowerState::Running));
    }

    #[test]
    fn icon_file_is_sent_as_data_and_theme_name_as_name() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let fake = FakeHypervisor::with_domains(&[
            ("web1", PowerState::ShutOff),
            ("db1", PowerState::ShutOff),
        ]);
        let (tray, _) = tray(&fake, &[("web1", path.as_str()), ("db1", "computer")]);

        let menu = tray.menu();
        let from_file = submenu(&menu[0]);
        assert_eq!(from_file.icon_data, b"\x89PNG".to_vec());
        assert!(from_file.icon_name.is_empty());

        let themed = submenu(&menu[1]);
        assert_eq!(themed.icon_name, "computer");
        assert!(themed.icon_data.is_empty());
    }

    #[test]
    fn reopening_the_menu_shows_changes_made_elsewhere() {
        let fake = FakeHypervisor::with_domains(&[("web1", PowerState::ShutOff)]);
        let (mut tray, _) = tray(&fake, &[("web1", "computer")]);
        assert_eq!(submenu(&tray.menu()[0]).label, "web1 (shut off)");

        fake.set_power("web1", PowerState::Running);
        tray.menu_about_to_show();
        assert_eq!(submenu(&tray.menu()[0]).label, "web1 (running)");
    }

    #[test]
    fn tool_tip_counts_configured_domains_without_queries() {
        let fake = FakeHypervisor::with_domains(&[("web1", PowerState::Running)]);
        let (tray, _) = tray(&fake, &[("web1", "computer"), ("db1", "computer")]);
        fake.remove("web1");

        let tip = tray.tool_tip();
        assert_eq!(tip.title, "Virtray");
        assert_eq!(tip.description, "2 domains configured");
    }
}
