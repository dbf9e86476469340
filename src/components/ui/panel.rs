use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    // Side panels of the builder: outline on the left, inspector on the right.
    clx! {Panel, aside, "bg-card text-card-foreground flex h-full flex-col gap-3 border-r py-4 text-sm"}
    clx! {PanelHeader, div, "flex items-center justify-between gap-2 px-4"}
    clx! {PanelTitle, h2, "text-xs font-semibold uppercase tracking-wide text-muted-foreground"}
    clx! {PanelBody, div, "flex min-h-0 flex-1 flex-col gap-2 overflow-y-auto px-4"}
    clx! {PanelFooter, footer, "flex items-center gap-2 border-t px-4 pt-3"}

    clx! {TreeList, ul, "flex flex-col gap-0.5"}
    clx! {TreeRow, li, "flex items-center gap-1 rounded px-2 py-1 hover:bg-accent data-[selected=true]:bg-primary/10 data-[selected=true]:text-primary"}
}

pub use components::*;
