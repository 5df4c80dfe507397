//! The navigation bar shown at the top of every back-office page.

use maud::{Markup, html};

use crate::endpoints;

/// The pages listed in the navigation bar, in display order.
const NAV_LINKS: [(&str, &str); 2] = [
    (endpoints::CUSTOMERS_VIEW, "Customers"),
    (endpoints::NEW_CUSTOMER_VIEW, "New Customer"),
];

const CURRENT_LINK_STYLE: &str = "block rounded px-3 py-2 text-sm font-semibold \
    bg-blue-50 text-blue-700 dark:bg-blue-900/30 dark:text-blue-200";

const LINK_STYLE: &str = "block rounded px-3 py-2 text-sm font-medium \
    text-gray-700 hover:bg-gray-100 hover:text-blue-700 dark:text-gray-300 \
    dark:hover:bg-gray-800 dark:hover:text-blue-200";

struct NavLink {
    url: &'static str,
    title: &'static str,
    is_current: bool,
}

pub struct NavBar {
    links: Vec<NavLink>,
}

impl NavBar {
    /// Build the navigation bar for the page served at `endpoint`.
    ///
    /// Account pages belong to the customers section, so they highlight the
    /// customers link.
    pub fn new(endpoint: &str) -> NavBar {
        let section = match endpoint {
            endpoints::ACCOUNT_VIEW => endpoints::CUSTOMERS_VIEW,
            other => other,
        };

        let links = NAV_LINKS
            .iter()
            .map(|&(url, title)| NavLink {
                url,
                title,
                is_current: url == section,
            })
            .collect();

        NavBar { links }
    }

    pub fn into_html(self) -> Markup {
        html!(
            nav class="bg-white border-b border-gray-200 dark:bg-gray-900 dark:border-gray-700"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between
                        gap-4 mx-auto px-4 py-3"
                {
                    a href=(endpoints::ROOT) class="flex items-center gap-3"
                    {
                        img src="/static/favicon-128x128.png" alt="Bankdesk Logo" class="h-8";

                        span class="text-xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Bankdesk"
                        }
                    }

                    ul class="flex items-center gap-2" aria-label="Primary"
                    {
                        @for link in &self.links {
                            li
                            {
                                a
                                    href=(link.url)
                                    class=(if link.is_current { CURRENT_LINK_STYLE } else { LINK_STYLE })
                                    aria-current=[link.is_current.then_some("page")]
                                {
                                    (link.title)
                                }
                            }
                        }
                    }
                }
            }
        )
    }
}
