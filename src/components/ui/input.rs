use leptos::prelude::*;
use tw_merge::tw_merge;
use wasm_bindgen::JsCast;

const FIELD_BASE: &str = "placeholder:text-muted-foreground border-input w-full min-w-0 rounded-md border bg-transparent px-3 py-1 text-sm shadow-xs outline-none focus-visible:border-ring focus-visible:ring-2 focus-visible:ring-ring/50 disabled:cursor-not-allowed disabled:opacity-50";

#[component]
pub fn Input(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] placeholder: String,
    #[prop(into, optional)] id: String,
    #[prop(optional)] disabled: bool,

    // Manual wiring instead of `bind:value`, which has moved between Leptos releases.
    #[prop(into)] bind_value: RwSignal<String>,

    /// Fired on Enter with the current value.
    #[prop(optional)] on_enter: Option<Callback<String>>,
) -> impl IntoView {
    let merged_class = tw_merge!("h-8", FIELD_BASE, class);

    let on_input = move |ev: web_sys::Event| {
        if let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        {
            bind_value.set(input.value());
        }
    };

    let on_keydown = move |ev: web_sys::KeyboardEvent| {
        if ev.key() == "Enter" {
            if let Some(cb) = on_enter {
                ev.prevent_default();
                cb.run(bind_value.get_untracked());
            }
        }
    };

    view! {
        <input
            data-name="Input"
            type="text"
            class=merged_class
            placeholder=placeholder
            id=id
            disabled=disabled
            prop:value=move || bind_value.get()
            on:input=on_input
            on:keydown=on_keydown
        />
    }
}

/// Multi-line field, used for raw property patches.
#[component]
pub fn TextArea(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] placeholder: String,
    #[prop(optional)] rows: Option<u32>,
    #[prop(into)] bind_value: RwSignal<String>,
) -> impl IntoView {
    let merged_class = tw_merge!(FIELD_BASE, "font-mono text-xs py-2", class);

    let on_input = move |ev: web_sys::Event| {
        if let Some(area) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
        {
            bind_value.set(area.value());
        }
    };

    view! {
        <textarea
            data-name="TextArea"
            class=merged_class
            placeholder=placeholder
            rows=rows.unwrap_or(6)
            prop:value=move || bind_value.get()
            on:input=on_input
        />
    }
}

/// Label above a control.
#[component]
pub fn Field(#[prop(into)] label: String, children: Children) -> impl IntoView {
    view! {
        <label class="flex flex-col gap-1 text-xs font-medium text-muted-foreground">
            <span>{label}</span>
            {children()}
        </label>
    }
}
