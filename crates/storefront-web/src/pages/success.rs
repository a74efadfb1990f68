//! Success Page

use leptos::prelude::*;

#[component]
pub fn SuccessPage() -> impl IntoView {
    view! {
        <div class="success">
            <h1>"Thank you!"</h1>
            <p>"Your payment was received and your order is being prepared."</p>
            <a href="/" class="btn btn-primary">"Continue Shopping"</a>
        </div>
    }
}
