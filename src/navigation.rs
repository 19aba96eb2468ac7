//! This file defines the navigation bar shared by the logged-in pages.

use maud::{Markup, html};

use crate::{
    endpoints::{self, format_fiat_endpoint},
    fiat::Fiat,
};

/// A link in the navigation bar.
///
/// It will change appearance if `is_current` is set to
/// `true`. Only one link should be set as active at any one time.
#[derive(Clone)]
struct Link {
    url: String,
    title: String,
    is_current: bool,
}

impl Link {
    fn new(url: String, title: String, active_url: &str) -> Self {
        let is_current = url == active_url;

        Self {
            url,
            title,
            is_current,
        }
    }

    fn into_desktop_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
        lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
        dark:hover:text-white lg:dark:hover:bg-transparent"
        };

        html!( a href=(self.url) class=(style) { (self.title) } )
    }

    fn into_mobile_html(self) -> Markup {
        let style = if self.is_current {
            "flex w-full min-w-0 items-center justify-center rounded-lg \
            bg-blue-50 px-2 py-2 text-xs font-semibold leading-tight \
            text-blue-700 shadow-sm dark:bg-blue-900/30 dark:text-blue-200"
        } else {
            "flex w-full min-w-0 items-center justify-center rounded-lg \
            px-2 py-2 text-xs font-semibold leading-tight text-gray-600 \
            hover:bg-blue-50/70 hover:text-blue-700 dark:text-gray-300 \
            dark:hover:bg-blue-900/20 dark:hover:text-blue-200"
        };

        html! {
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                span class="truncate" { (self.title) }
            }
        }
    }
}

pub struct NavBar {
    links: Vec<Link>,
}

impl NavBar {
    /// Get the navigation bar.
    ///
    /// If a link matches `active_url`, then that link will be
    /// marked as active and displayed differently in the HTML.
    /// `active_url` is the path with the currency filled in, e.g. "/dashboard/cop".
    pub fn new(active_url: &str) -> NavBar {
        let mut links = Vec::with_capacity(2 * Fiat::ALL.len() + 1);

        for fiat in Fiat::ALL {
            links.push(Link::new(
                format_fiat_endpoint(endpoints::DASHBOARD_VIEW, fiat),
                format!("{} Dashboard", fiat.code()),
                active_url,
            ));
        }

        for fiat in Fiat::ALL {
            links.push(Link::new(
                format_fiat_endpoint(endpoints::BALANCES_VIEW, fiat),
                format!("{} Balances", fiat.code()),
                active_url,
            ));
        }

        links.push(Link {
            url: endpoints::LOG_OUT.to_owned(),
            title: "Log out".to_owned(),
            is_current: false,
        });

        NavBar { links }
    }

    pub fn into_html(self) -> Markup {
        let links = self.links;

        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href="/"
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Balance MGS"
                        }
                    }

                    div class="hidden w-full lg:block lg:w-auto"
                    {
                        ul
                            class="font-medium flex flex-col p-4 lg:p-0 mt-4
                            border border-gray-100 rounded bg-gray-50
                            lg:flex-row lg:space-x-8 rtl:space-x-reverse lg:mt-0
                            lg:border-0 lg:bg-white dark:bg-gray-800
                            lg:dark:bg-gray-900 dark:border-gray-700"
                        {
                            @for link in links.clone() {
                                li { (link.into_desktop_html()) }
                            }
                        }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden"
            {
                div class="mx-auto max-w-screen-xl px-4 pb-4"
                {
                    div
                        class="rounded-xl border border-gray-200 bg-white/95
                        shadow-lg backdrop-blur dark:border-gray-700 dark:bg-gray-900/95"
                    {
                        ul
                            class="grid grid-cols-5 gap-1 px-2 py-3"
                            aria-label="Primary"
                        {
                            @for link in links {
                                li class="min-w-0" { (link.into_mobile_html()) }
                            }
                        }
                    }
                }
            }
        )
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use crate::{endpoints, navigation::NavBar};

    #[test]
    fn set_active_endpoint() {
        let cases = [
            ("/dashboard/ves", true),
            ("/dashboard/cop", true),
            ("/dashboard/ves/balances", true),
            ("/dashboard/cop/balances", true),
            (endpoints::ROOT, false),
            (endpoints::LOG_IN_VIEW, false),
            (endpoints::LOG_OUT, false),
            (endpoints::EDIT_TRANSACTION_VIEW, false),
        ];

        for (endpoint, should_be_active) in cases {
            let nav_bar = NavBar::new(endpoint);

            assert_link_active(nav_bar, endpoint, should_be_active);
        }
    }

    #[test]
    fn has_link_per_page_and_log_out() {
        let nav_bar = NavBar::new(endpoints::DEFAULT_DASHBOARD);

        let titles: Vec<&str> = nav_bar.links.iter().map(|link| link.title.as_str()).collect();

        assert_eq!(
            titles,
            [
                "VES Dashboard",
                "COP Dashboard",
                "VES Balances",
                "COP Balances",
                "Log out"
            ]
        );
    }

    #[track_caller]
    fn assert_link_active(nav_bar: NavBar, endpoint: &str, should_be_active: bool) {
        let active_links: Vec<_> = nav_bar
            .links
            .iter()
            .filter(|link| link.is_current)
            .map(|link| link.url.as_str())
            .collect();

        if should_be_active {
            assert_eq!(active_links, [endpoint], "wrong active links for {endpoint}");
        } else {
            assert!(
                active_links.is_empty(),
                "want no active links for {endpoint}, got {active_links:?}"
            );
        }
    }
}
