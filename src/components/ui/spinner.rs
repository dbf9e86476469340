use icons::LoaderCircle;
use leptos::prelude::*;
use tw_merge::tw_merge;

#[component]
pub fn Spinner(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] label: String,
) -> impl IntoView {
    let merged_class = tw_merge!("size-4 animate-spin", class);
    let aria = if label.is_empty() { "Loading".to_string() } else { label.clone() };

    view! {
        <span class="inline-flex items-center gap-2 text-xs text-muted-foreground">
            <LoaderCircle class=merged_class attr:role="status" attr:aria-label=aria />
            {label}
        </span>
    }
}
