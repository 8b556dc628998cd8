//! Structural rewrites over component forests.
//!
//! A schema's component list is a forest: tab containers and split views nest
//! further forests, widgets are leaves. [`transform_forest`] applies a node
//! mapping bottom-up so a rewrite sees children that were already rewritten,
//! and [`activate_tab`] / [`close_tab`] build the two tab rewrites on top of
//! it. All of these return new forests; inputs are never mutated.

use app_schema::{TabContainerProps, UiComponent};

/// Applies `f` to every node of `nodes`, children before parents.
pub fn transform_forest<F>(nodes: &[UiComponent], f: &F) -> Vec<UiComponent>
where
    F: Fn(UiComponent) -> UiComponent,
{
    nodes.iter().map(|node| transform_node(node, f)).collect()
}

/// Applies `f` to `node` after rewriting its nested forests.
pub fn transform_node<F>(node: &UiComponent, f: &F) -> UiComponent
where
    F: Fn(UiComponent) -> UiComponent,
{
    let rewritten = match node {
        UiComponent::TabContainer(props) => {
            let mut props = props.clone();
            for tab in &mut props.tabs {
                tab.components = transform_forest(&tab.components, f);
            }
            UiComponent::TabContainer(props)
        }
        UiComponent::SplitView(props) => {
            let mut props = props.clone();
            props.left_components = transform_forest(&props.left_components, f);
            props.right_components = transform_forest(&props.right_components, f);
            UiComponent::SplitView(props)
        }
        UiComponent::Widget(widget) => UiComponent::Widget(widget.clone()),
    };
    f(rewritten)
}

/// Marks `tab_id` active in whichever tab container defines it.
///
/// Containers that do not define the tab are returned unchanged, so activating
/// a tab in one container never disturbs the active tab of a sibling or
/// ancestor container.
pub fn activate_tab(nodes: &[UiComponent], tab_id: &str) -> Vec<UiComponent> {
    transform_forest(nodes, &|node| match node {
        UiComponent::TabContainer(mut props) if defines_tab(&props, tab_id) => {
            props.active_tab = Some(tab_id.to_owned());
            UiComponent::TabContainer(props)
        }
        other => other,
    })
}

/// Removes `tab_id` from whichever tab container defines it.
///
/// When the closed tab was the active one, the first remaining tab becomes
/// active (or no tab, when the container is now empty). Closing a tab that
/// was not active leaves the active tab untouched.
pub fn close_tab(nodes: &[UiComponent], tab_id: &str) -> Vec<UiComponent> {
    transform_forest(nodes, &|node| match node {
        UiComponent::TabContainer(mut props) if defines_tab(&props, tab_id) => {
            let was_active = props
                .active_tab
                .as_deref()
                .map(|active| active == tab_id)
                .unwrap_or(false);
            props.tabs.retain(|tab| tab.id != tab_id);
            if was_active {
                props.active_tab = props.tabs.first().map(|tab| tab.id.clone());
            }
            UiComponent::TabContainer(props)
        }
        other => other,
    })
}

fn defines_tab(props: &TabContainerProps, tab_id: &str) -> bool {
    props.tabs.iter().any(|tab| tab.id == tab_id)
}

#[cfg(test)]
mod tests {
    use app_schema::{
        SplitViewProps, TabContainerProps, TabDefinition, WidgetComponent,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn widget(kind: &str) -> UiComponent {
        UiComponent::Widget(WidgetComponent {
            kind: kind.to_owned(),
            props: json!({}),
        })
    }

    fn tab(id: &str, components: Vec<UiComponent>) -> TabDefinition {
        TabDefinition {
            id: id.to_owned(),
            label: id.to_uppercase(),
            icon: None,
            components,
        }
    }

    fn tab_container(tabs: Vec<TabDefinition>, active: Option<&str>) -> UiComponent {
        UiComponent::TabContainer(TabContainerProps {
            tabs,
            active_tab: active.map(str::to_owned),
        })
    }

    #[test]
    fn identity_transform_rebuilds_an_equal_forest() {
        let forest = vec![
            widget("text"),
            tab_container(vec![tab("a", vec![widget("list")])], Some("a")),
        ];
        assert_eq!(transform_forest(&forest, &|n| n), forest);
    }

    #[test]
    fn activate_tab_switches_the_defining_container() {
        let forest = vec![tab_container(
            vec![tab("home", vec![]), tab("settings", vec![])],
            Some("home"),
        )];
        let out = activate_tab(&forest, "settings");
        let UiComponent::TabContainer(props) = &out[0] else {
            panic!("expected tab container");
        };
        assert_eq!(props.active_tab.as_deref(), Some("settings"));
        // Activating again is a no-op.
        assert_eq!(activate_tab(&out, "settings"), out);
    }

    #[test]
    fn activate_tab_leaves_non_matching_containers_untouched() {
        let forest = vec![
            tab_container(vec![tab("a", vec![]), tab("b", vec![])], Some("a")),
            tab_container(vec![tab("x", vec![]), tab("y", vec![])], Some("x")),
        ];
        let out = activate_tab(&forest, "y");
        let UiComponent::TabContainer(first) = &out[0] else {
            panic!("expected tab container");
        };
        let UiComponent::TabContainer(second) = &out[1] else {
            panic!("expected tab container");
        };
        assert_eq!(first.active_tab.as_deref(), Some("a"));
        assert_eq!(second.active_tab.as_deref(), Some("y"));
    }

    #[test]
    fn activate_unknown_tab_is_identity() {
        let forest = vec![tab_container(vec![tab("a", vec![])], Some("a"))];
        assert_eq!(activate_tab(&forest, "missing"), forest);
    }

    #[test]
    fn activate_tab_reaches_containers_nested_in_split_views() {
        let inner = tab_container(vec![tab("left", vec![]), tab("right", vec![])], Some("left"));
        let forest = vec![UiComponent::SplitView(SplitViewProps {
            left_components: vec![inner],
            right_components: vec![widget("text")],
            ..SplitViewProps::default()
        })];
        let out = activate_tab(&forest, "right");
        let UiComponent::SplitView(split) = &out[0] else {
            panic!("expected split view");
        };
        let UiComponent::TabContainer(props) = &split.left_components[0] else {
            panic!("expected tab container");
        };
        assert_eq!(props.active_tab.as_deref(), Some("right"));
        assert_eq!(split.right_components, vec![widget("text")]);
    }

    #[test]
    fn close_active_tab_promotes_first_remaining() {
        let forest = vec![tab_container(
            vec![tab("a", vec![]), tab("b", vec![]), tab("c", vec![])],
            Some("b"),
        )];
        let out = close_tab(&forest, "b");
        let UiComponent::TabContainer(props) = &out[0] else {
            panic!("expected tab container");
        };
        assert_eq!(props.tabs.len(), 2);
        assert_eq!(props.active_tab.as_deref(), Some("a"));
    }

    #[test]
    fn close_inactive_tab_keeps_active_tab() {
        let forest = vec![tab_container(
            vec![tab("a", vec![]), tab("b", vec![])],
            Some("a"),
        )];
        let out = close_tab(&forest, "b");
        let UiComponent::TabContainer(props) = &out[0] else {
            panic!("expected tab container");
        };
        assert_eq!(props.active_tab.as_deref(), Some("a"));
        assert_eq!(props.tabs.len(), 1);
    }

    #[test]
    fn close_last_tab_clears_active_tab() {
        let forest = vec![tab_container(vec![tab("only", vec![])], Some("only"))];
        let out = close_tab(&forest, "only");
        let UiComponent::TabContainer(props) = &out[0] else {
            panic!("expected tab container");
        };
        assert!(props.tabs.is_empty());
        assert_eq!(props.active_tab, None);
    }

    #[test]
    fn nested_tab_containers_close_independently() {
        let inner = tab_container(
            vec![tab("inner-a", vec![]), tab("inner-b", vec![])],
            Some("inner-a"),
        );
        let forest = vec![tab_container(
            vec![tab("outer-a", vec![inner]), tab("outer-b", vec![])],
            Some("outer-a"),
        )];
        let out = close_tab(&forest, "inner-a");
        let UiComponent::TabContainer(outer) = &out[0] else {
            panic!("expected tab container");
        };
        assert_eq!(outer.active_tab.as_deref(), Some("outer-a"));
        let UiComponent::TabContainer(inner_out) = &outer.tabs[0].components[0] else {
            panic!("expected nested tab container");
        };
        assert_eq!(inner_out.tabs.len(), 1);
        assert_eq!(inner_out.active_tab.as_deref(), Some("inner-b"));
    }
}
