use icons::X;
use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative flex w-full items-start gap-3 rounded-lg border px-4 py-3 text-sm"}
    clx! {AlertDescription, p, "flex-1 text-sm [&_p]:leading-relaxed"}
}

pub use components::*;

/// Dismissable banner for refusals and save results.
#[component]
pub fn NoticeBar(message: RwSignal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || message.with(|m| m.is_some())>
            <Alert class="mx-4 mt-3 bg-muted/40">
                <AlertDescription>{move || message.get().unwrap_or_default()}</AlertDescription>
                <button
                    class="text-muted-foreground hover:text-foreground"
                    aria-label="Dismiss"
                    on:click=move |_| message.set(None)
                >
                    <X class="size-4" />
                </button>
            </Alert>
        </Show>
    }
}
