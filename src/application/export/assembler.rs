//! Turns content into the final ordered component sequence.
//!
//! Steps run in a fixed order: split the body, prepend synthesized leading
//! components, splice the pull quote and the advertisement, pair anchored
//! components with their targets, then merge runs of body text. Anchoring
//! runs after the insertions so synthesized components take part in it, and
//! grouping runs last because it reads the identifiers anchoring sets.

use tracing::{debug, instrument};

use super::{
    ExportContext,
    component::{AnchorPosition, Component, Role},
    factory::{ComponentFactory, Directive},
    registry::{LayoutRegistry, LayoutSpec, Margin},
    settings::LayoutGrid,
};
use crate::domain::{
    content::Content,
    settings::{BodyOrientation, PULLQUOTE, PullQuotePosition},
};

pub const ANCHOR_TARGET_LAYOUT: &str = "anchor-target-layout";

/// Run every assembly step for `content`.
#[instrument(skip_all, fields(content_id = %content.id))]
pub fn assemble(context: &mut ExportContext, content: &Content) -> Vec<Component> {
    let mut components = {
        let mut factory = ComponentFactory::new(context);

        let body = factory.from_html(&content.body);
        let mut components = leading_components(&mut factory, content);
        components.extend(body);

        if let Some(text) = content.settings.text(PULLQUOTE) {
            let position = content
                .settings
                .pullquote_position()
                .unwrap_or(PullQuotePosition::Middle)
                .resolve(components.len());
            if let Some(quote) = factory.directive(Directive::PullQuote, text) {
                insert_pullquote(&mut components, quote, position);
            }
        }

        if factory.context().settings.enable_advertisement
            && let Some(ad) = factory.directive(Directive::Advertisement, "")
        {
            insert_advertisement(&mut components, ad);
        }
        components
    };

    let orientation = context.settings.body_orientation;
    let grid = context.settings.layout;
    anchor_components(&mut components, orientation, grid, &mut context.layouts);

    let components = group_body_components(components);
    debug!(
        target = "application::export::assembler",
        op = "assemble",
        components = components.len(),
        "assembled components"
    );
    components
}

/// Cover, title, byline and intro, in that order, skipping unset ones.
fn leading_components(factory: &mut ComponentFactory<'_>, content: &Content) -> Vec<Component> {
    let mut leading = Vec::new();
    if let Some(cover) = content.cover() {
        leading.extend(factory.directive(Directive::Cover, cover));
    }
    leading.extend(factory.directive(Directive::Title, &content.title));
    if let Some(byline) = content.byline() {
        leading.extend(factory.directive(Directive::Byline, byline));
    }
    if let Some(intro) = content.intro() {
        leading.extend(factory.directive(Directive::Intro, intro));
    }
    leading
}

/// Splice `quote` at `position` when it falls strictly inside the sequence.
/// Returns whether the quote was inserted.
pub fn insert_pullquote(components: &mut Vec<Component>, quote: Component, position: usize) -> bool {
    if position == 0 || position >= components.len() {
        debug!(
            target = "application::export::assembler",
            position,
            count = components.len(),
            "pull quote position out of range"
        );
        return false;
    }
    components.insert(position, quote);
    true
}

pub fn advertisement_index(count: usize) -> usize {
    count.div_ceil(2)
}

pub fn insert_advertisement(components: &mut Vec<Component>, advertisement: Component) {
    let index = advertisement_index(components.len());
    components.insert(index, advertisement);
}

/// Pair every component asking for a side position with a neighbouring
/// target. Centered bodies never anchor.
pub fn anchor_components(
    components: &mut [Component],
    orientation: BodyOrientation,
    grid: LayoutGrid,
    layouts: &mut LayoutRegistry,
) {
    if orientation == BodyOrientation::Center {
        return;
    }

    for index in 0..components.len() {
        let component = &components[index];
        let requested = component.anchor_position();
        if requested == AnchorPosition::None
            || component.is_anchor_target()
            || component.anchor().is_some()
        {
            continue;
        }

        let Some(target) = find_anchor_target(components, index) else {
            debug!(
                target = "application::export::assembler",
                op = "anchor",
                index,
                "no eligible anchor target, leaving component unanchored"
            );
            continue;
        };

        let side = match requested {
            AnchorPosition::Auto if orientation == BodyOrientation::Left => AnchorPosition::Right,
            AnchorPosition::Auto => AnchorPosition::Left,
            explicit => explicit,
        };
        let anchored_layout = register_anchor_layouts(layouts, grid, orientation, side);

        let target_component = &mut components[target];
        target_component.mark_anchor_target();
        target_component.set_anchor_position(side.opposite());
        target_component.set_layout(ANCHOR_TARGET_LAYOUT);
        let target_uid = target_component.uid().to_string();

        let anchored = &mut components[index];
        anchored.anchor_to(target_uid);
        anchored.set_anchor_position(side);
        anchored.set_layout(anchored_layout);
    }
}

/// Previous component when eligible, otherwise the first eligible one after.
fn find_anchor_target(components: &[Component], index: usize) -> Option<usize> {
    let previous = index
        .checked_sub(1)
        .filter(|&previous| components[previous].can_be_anchor_target());
    previous.or_else(|| {
        (index + 1..components.len()).find(|&next| components[next].can_be_anchor_target())
    })
}

fn register_anchor_layouts(
    layouts: &mut LayoutRegistry,
    grid: LayoutGrid,
    orientation: BodyOrientation,
    side: AnchorPosition,
) -> String {
    let side_span = grid.side_span();
    let start = match side {
        AnchorPosition::Right => grid.body_column_span,
        _ => 0,
    };
    let name = format!("anchor-layout-{}", side.as_str());
    layouts.register_with(&name, || {
        LayoutSpec::columns(start, side_span).with_margin(Margin::new(15, 15))
    });
    layouts.register_with(ANCHOR_TARGET_LAYOUT, || {
        LayoutSpec::columns(grid.body_column_start(orientation), grid.body_column_span)
            .with_margin(Margin::bottom(12))
    });
    name
}

/// Merge consecutive body components.
///
/// Anchor targets keep their identity: a target followed by its anchored
/// sibling and a plain body emits the sibling first and continues the run
/// from the target; a target followed by a plain body absorbs it; any other
/// target stands alone. Runs are trimmed when flushed and the run still open
/// at the end gets a trailing newline. Applying this to its own output
/// changes nothing.
pub fn group_body_components(components: Vec<Component>) -> Vec<Component> {
    let mut slots: Vec<Option<Component>> = components.into_iter().map(Some).collect();
    let mut grouped = Vec::with_capacity(slots.len());
    let mut run: Option<Component> = None;
    let mut index = 0;

    while index < slots.len() {
        let Some(current) = slots[index].as_ref() else {
            index += 1;
            continue;
        };

        if current.role() != Role::Body {
            flush(&mut run, &mut grouped);
            grouped.extend(slots[index].take());
            index += 1;
            continue;
        }

        if let Some(identifier) = current.identifier().map(str::to_string) {
            flush(&mut run, &mut grouped);

            let sibling_then_plain = slots
                .get(index + 1)
                .and_then(Option::as_ref)
                .is_some_and(|sibling| sibling.anchors_to(&identifier))
                && is_plain_body(slots.get(index + 2));
            if sibling_then_plain {
                grouped.extend(slots[index + 1].take());
                run = merge(slots[index].take(), slots[index + 2].take());
                index += 3;
                continue;
            }

            if is_plain_body(slots.get(index + 1)) {
                run = merge(slots[index].take(), slots[index + 1].take());
                index += 2;
                continue;
            }

            grouped.extend(slots[index].take());
            index += 1;
            continue;
        }

        if current.anchor().is_some() {
            flush(&mut run, &mut grouped);
            grouped.extend(slots[index].take());
            index += 1;
            continue;
        }

        let next = slots[index].take();
        if let Some(open) = run.as_mut() {
            let text = next.as_ref().and_then(Component::body_text).unwrap_or_default();
            open.append_body_text(text);
        } else {
            run = next;
        }
        index += 1;
    }

    if let Some(mut open) = run {
        let text = format!("{}\n", open.body_text().unwrap_or_default().trim());
        open.set_body_text(text);
        grouped.push(open);
    }
    grouped
}

fn is_plain_body(slot: Option<&Option<Component>>) -> bool {
    slot.and_then(Option::as_ref).is_some_and(|component| {
        component.role() == Role::Body
            && !component.is_anchor_target()
            && component.anchor().is_none()
    })
}

fn merge(target: Option<Component>, plain: Option<Component>) -> Option<Component> {
    let mut target = target?;
    if let Some(plain) = plain {
        target.append_body_text(plain.body_text().unwrap_or_default());
    }
    Some(target)
}

fn flush(run: &mut Option<Component>, grouped: &mut Vec<Component>) {
    if let Some(mut open) = run.take() {
        let text = open.body_text().unwrap_or_default().trim().to_string();
        open.set_body_text(text);
        grouped.push(open);
    }
}
