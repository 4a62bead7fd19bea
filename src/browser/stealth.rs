//! Fingerprint-masking script injected before any portal document loads.
//!
//! The portal's widget bundle probes for automation markers; this runs on
//! every new document so the probes see an ordinary desktop Chrome.

pub const STEALTH_SCRIPT: &str = r#"
// 0. Navigator hardening (webdriver + languages) — do this before anything else
(() => {
    try {
        const proto = Navigator.prototype;

        // webdriver: prefer "absent" (undefined) over false
        try {
            Object.defineProperty(proto, 'webdriver', {
                get: () => undefined,
                configurable: true,
            });
        } catch (e) {}
        try { delete navigator.webdriver; } catch (e) {}

        // languages: realistic bilingual list for the portal's locale
        try {
            Object.defineProperty(proto, 'languages', {
                get: () => ['ar-EG', 'ar', 'en-US', 'en'],
                configurable: true,
            });
        } catch (e) {}

        // plugins: simple non-empty stub
        try {
            Object.defineProperty(proto, 'plugins', {
                get: () => [1, 2, 3, 4, 5],
                configurable: true,
            });
        } catch (e) {}
    } catch (e) {}
})();

// 1. Chrome runtime presence (headless builds omit it)
if (!window.chrome) {
    window.chrome = {};
}
if (!window.chrome.runtime) {
    window.chrome.runtime = {
        connect: function() { return { onDisconnect: { addListener: function() {} } }; },
        sendMessage: function() {},
    };
}

// 2. Permissions query (notification permission probe)
const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
if (originalQuery) {
    window.navigator.permissions.query = (parameters) => (
        parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters)
    );
}

// 3. Driver-framework marker cleanup
delete window.__playwright;
delete window.__puppeteer;
delete window.__selenium;
delete window.callPhantom;
delete window._phantom;
"#;
