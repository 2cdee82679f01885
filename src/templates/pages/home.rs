// templates/pages/home.rs

use crate::templates::desktop_layout;
use maud::{html, Markup};

pub fn home_page() -> Markup {
    desktop_layout(
        "Listing Scraper",
        html! {
            h1 { "Listing Scraper" }

            p { "Service is up." }
            p {
                "POST a listing URL to "
                code { "/api/scrape" }
                " to extract and store it."
            }
        },
    )
}
