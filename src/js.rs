//! Scripts executed in the host page.
//!
//! Every value that comes from Rust is passed through `arguments`, never spliced
//! into the source, so nothing here needs escaping.

/// `arguments`: none. Returns whether the document is usable.
pub const PAGE_READY: &str = r#"
    return document.readyState !== 'loading' && !!document.body;
"#;

/// `arguments`: `[key]`. Returns `true` the first time a key is claimed on
/// this page load.
pub const CLAIM_REGISTRY_KEY: &str = r#"
    const registry = (window.__chatWidgetRegistry = window.__chatWidgetRegistry || {});
    if (registry[arguments[0]] === true) return false;
    registry[arguments[0]] = true;
    return true;
"#;

/// `arguments`: `[id]`.
pub const HAS_ELEMENT: &str = r#"
    return !!document.getElementById(arguments[0]);
"#;

/// `arguments`: none. Reads the page-level endpoint override.
pub const ENDPOINT_OVERRIDE: &str = r#"
    const url = window.CHAT_WIDGET_URL;
    return (typeof url === 'string' && url.trim().length > 0) ? url.trim() : null;
"#;

/// `arguments`: `[rootId]`. Empties the widget's event queue and returns what
/// was in it.
pub const DRAIN_EVENTS: &str = r#"
    const queues = window.__chatWidgetEvents || {};
    const queue = queues[arguments[0]];
    if (!queue) return [];
    return queue.splice(0, queue.length);
"#;

/// `arguments`: `[panelId, visible]`.
pub const SET_PANEL_VISIBLE: &str = r#"
    const panel = document.getElementById(arguments[0]);
    if (!panel) return false;
    panel.style.setProperty('display', arguments[1] ? 'flex' : 'none', 'important');
    return true;
"#;

/// `arguments`: `[inputId, delayMs]`. The delay lets the display change land
/// before focusing.
pub const FOCUS_INPUT: &str = r#"
    const input = document.getElementById(arguments[0]);
    if (!input) return false;
    setTimeout(() => input.focus(), arguments[1]);
    return true;
"#;

/// `arguments`: `[logId, html]`.
pub const RENDER_TRANSCRIPT: &str = r#"
    const log = document.getElementById(arguments[0]);
    if (!log) return false;
    log.innerHTML = arguments[1];
    return true;
"#;

/// `arguments`: `[logId]`.
pub const SCROLL_TO_BOTTOM: &str = r#"
    const log = document.getElementById(arguments[0]);
    if (!log) return false;
    log.scrollTop = log.scrollHeight;
    return true;
"#;

/// `arguments`: `[{ ids, accent, strings }]`.
///
/// Builds the icon and the hidden panel under one root element. Returns `false`
/// without touching the page if the root already exists, and throws if the
/// body is not there yet so the caller can retry. Clicks and submissions are
/// queued on `window.__chatWidgetEvents[rootId]` for the controller to drain.
/// A submission empties the input as it is queued, so a second Enter before
/// the next drain has nothing to send.
pub const INJECT_WIDGET: &str = r#"
    const cfg = arguments[0];
    const ids = cfg.ids;
    const accent = cfg.accent;
    const text = cfg.strings;

    if (document.getElementById(ids.root)) return false;
    if (!document.body) throw new Error('document.body is not available yet');

    const queues = (window.__chatWidgetEvents = window.__chatWidgetEvents || {});
    const queue = (queues[ids.root] = queues[ids.root] || []);

    function css(el, rules) {
        for (const [prop, value] of Object.entries(rules)) {
            el.style.setProperty(prop, value, 'important');
        }
    }

    function make(tag, id, rules) {
        const el = document.createElement(tag);
        if (id) el.id = id;
        css(el, Object.assign({
            'box-sizing': 'border-box',
            'font-family': 'Arial, sans-serif',
            'margin': '0',
            'visibility': 'visible',
            'opacity': '1',
            'pointer-events': 'auto',
        }, rules));
        return el;
    }

    const root = make('div', ids.root, {
        'position': 'static',
        'width': '0',
        'height': '0',
        'overflow': 'visible',
    });

    const style = document.createElement('style');
    style.textContent = `
        #${ids.log} .cw-entry { margin: 0 0 10px 0 !important; font-size: 14px !important; line-height: 1.5 !important; color: #222 !important; }
        #${ids.log} .cw-user { text-align: right !important; }
        #${ids.log} .cw-bubble { display: inline-block !important; max-width: 80% !important; padding: 10px 15px !important; white-space: pre-wrap !important; word-wrap: break-word !important; text-align: left !important; }
        #${ids.log} .cw-user .cw-bubble { background: ${accent} !important; color: #fff !important; border-radius: 15px 15px 5px 15px !important; }
        #${ids.log} .cw-bot .cw-bubble { background: #eef5ef !important; border-radius: 15px 15px 15px 5px !important; }
        #${ids.log} .cw-error .cw-bubble { background: #ffebee !important; color: #d32f2f !important; }
        #${ids.log} .cw-name { font-weight: bold !important; color: ${accent} !important; margin-bottom: 5px !important; }
        #${ids.log} .cw-dots { display: flex !important; align-items: center !important; height: 20px !important; }
        #${ids.log} .cw-dots span { width: 8px !important; height: 8px !important; margin: 0 2px !important; border-radius: 50% !important; background: ${accent} !important; opacity: 0.4; animation: cw-typing 1s infinite !important; }
        #${ids.log} .cw-dots span:nth-child(2) { animation-delay: 0.2s !important; }
        #${ids.log} .cw-dots span:nth-child(3) { animation-delay: 0.4s !important; }
        @keyframes cw-typing { 0%, 100% { opacity: 0.4; } 50% { opacity: 1; } }
    `;
    root.appendChild(style);

    const icon = make('div', ids.icon, {
        'position': 'fixed',
        'bottom': '25px',
        'right': '25px',
        'width': '60px',
        'height': '60px',
        'border-radius': '50%',
        'background': accent,
        'display': 'flex',
        'justify-content': 'center',
        'align-items': 'center',
        'cursor': 'pointer',
        'z-index': '2147483647',
        'box-shadow': '0 4px 12px rgba(0, 0, 0, 0.25)',
    });
    icon.setAttribute('role', 'button');
    icon.setAttribute('aria-label', text.title);
    icon.innerHTML = '<svg width="30" height="30" viewBox="0 0 24 24" fill="white"><path d="M20 2H4c-1.1 0-2 .9-2 2v18l4-4h14c1.1 0 2-.9 2-2V4c0-1.1-.9-2-2-2z"/></svg>';
    root.appendChild(icon);

    const panel = make('div', ids.panel, {
        'position': 'fixed',
        'bottom': '100px',
        'right': '20px',
        'width': '350px',
        'max-width': 'calc(100vw - 40px)',
        'height': '500px',
        'max-height': 'calc(100vh - 120px)',
        'background': '#fff',
        'border': '1px solid #e0e0e0',
        'border-radius': '15px',
        'display': 'none',
        'flex-direction': 'column',
        'overflow': 'hidden',
        'z-index': '2147483646',
        'box-shadow': '0 10px 30px rgba(0, 0, 0, 0.15)',
    });
    root.appendChild(panel);

    const header = make('div', ids.header, {
        'position': 'relative',
        'background': accent,
        'color': '#fff',
        'padding': '15px 40px 15px 15px',
        'font-weight': 'bold',
        'font-size': '16px',
    });
    header.textContent = text.title;
    panel.appendChild(header);

    const close = make('div', ids.close, {
        'position': 'absolute',
        'top': '10px',
        'right': '15px',
        'color': '#fff',
        'cursor': 'pointer',
        'font-size': '24px',
        'line-height': '1',
    });
    close.setAttribute('role', 'button');
    close.setAttribute('aria-label', text.close_label);
    close.textContent = '×';
    header.appendChild(close);

    const log = make('div', ids.log, {
        'flex': '1',
        'padding': '15px',
        'overflow-y': 'auto',
        'background': '#f9f9f9',
    });
    panel.appendChild(log);

    const row = make('div', null, {
        'display': 'flex',
        'border-top': '1px solid #e0e0e0',
        'padding': '10px',
        'background': '#fff',
    });
    panel.appendChild(row);

    const input = make('input', ids.input, {
        'flex': '1',
        'border': 'none',
        'outline': 'none',
        'padding': '12px 15px',
        'font-size': '14px',
        'border-radius': '25px',
        'background': '#f5f5f5',
        'color': '#222',
    });
    input.type = 'text';
    input.placeholder = text.placeholder;
    row.appendChild(input);

    const send = make('button', ids.send, {
        'width': '40px',
        'height': '40px',
        'margin-left': '10px',
        'border': 'none',
        'border-radius': '50%',
        'background': accent,
        'color': '#fff',
        'cursor': 'pointer',
        'font-size': '16px',
    });
    send.type = 'button';
    send.setAttribute('aria-label', text.send_label);
    send.textContent = '➤';
    row.appendChild(send);

    icon.addEventListener('click', () => queue.push({ kind: 'toggle', source: 'icon' }));
    close.addEventListener('click', () => queue.push({ kind: 'toggle', source: 'close_button' }));
    function submit() {
        const value = input.value;
        if (!value.trim()) return;
        queue.push({ kind: 'submit', text: value });
        input.value = '';
    }

    send.addEventListener('click', submit);
    input.addEventListener('keydown', (e) => {
        if (e.key === 'Enter') {
            e.preventDefault();
            submit();
        }
    });

    document.body.appendChild(root);
    return true;
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_empties_input_as_it_queues() {
        let handler = INJECT_WIDGET
            .split("function submit()")
            .nth(1)
            .and_then(|rest| rest.split("send.addEventListener").next())
            .unwrap();

        let push = handler.find("queue.push({ kind: 'submit'").unwrap();
        let clear = handler.find("input.value = '';").unwrap();
        assert!(push < clear);
        assert!(handler.contains("if (!value.trim()) return;"));
        assert!(INJECT_WIDGET.contains("send.addEventListener('click', submit);"));
    }
}
