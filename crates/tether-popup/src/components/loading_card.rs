use yew::{Callback, Html, Properties, function_component, html};

#[derive(Properties, PartialEq)]
pub struct LoadingCardProps {
    pub error: Option<String>,
    pub on_retry: Callback<()>,
    pub on_sign_out: Callback<()>,
}

#[function_component(LoadingCard)]
pub fn loading_card(props: &LoadingCardProps) -> Html {
    let Some(error) = &props.error else {
        return html! {
            <div class="card loading">
                <div class="spinner"></div>
                <div class="muted">{ "Loading..." }</div>
            </div>
        };
    };

    let on_retry = props.on_retry.clone();
    let on_sign_out = props.on_sign_out.clone();
    html! {
        <div class="card loading">
            <div class="header">{ "Could not load your organizations" }</div>
            <div class="error-text">{ error }</div>
            <div class="actions">
                <button class="btn" onclick={move |_| on_retry.emit(())}>{ "Retry" }</button>
                <button class="btn danger" onclick={move |_| on_sign_out.emit(())}>{ "Sign Out" }</button>
            </div>
        </div>
    }
}
