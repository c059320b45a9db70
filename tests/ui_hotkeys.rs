use folio_palette::ui::shortcuts;
use folio_palette::ui::tui::footer_legend;

#[test]
fn closed_footer_advertises_palette_chord() {
    let closed = footer_legend(false);
    for key in [
        shortcuts::TOGGLE_PALETTE,
        shortcuts::SCROLL,
        shortcuts::THEME,
        shortcuts::QUIT,
    ] {
        assert!(closed.contains(key), "closed footer should mention {key}");
    }
}

#[test]
fn open_footer_lists_palette_keys() {
    let open = footer_legend(true);
    assert!(open.contains(&format!("{}/{} select", shortcuts::SELECT_PREV, shortcuts::SELECT_NEXT)));
    assert!(open.contains(&format!("{} open", shortcuts::OPEN)));
    assert!(open.contains(&format!("{} close", shortcuts::CLOSE)));
    assert!(!open.contains(shortcuts::QUIT));
}
