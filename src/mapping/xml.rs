//! Hibernate mapping XML for a compiled descriptor.
//!
//! Output is deterministic: children of `class` always come out as `id`,
//! `many-to-one`*, `property`*, `bag`*, and attributes keep a fixed order.

use super::descriptor::{
    AssociationDescriptor, CollectionDescriptor, IdDescriptor, MappingDescriptor,
    PropertyDescriptor,
};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const DOCTYPE: &str = r#"<!DOCTYPE hibernate-mapping PUBLIC "-//Hibernate/Hibernate Mapping DTD 3.0//EN" "http://www.hibernate.org/dtd/hibernate-mapping-3.0.dtd">"#;
const INDENT: &str = "    ";

struct Element {
    tag: &'static str,
    attributes: Vec<(&'static str, String)>,
    children: Vec<Element>,
}

impl Element {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attributes.push((name, value.into()));
        self
    }

    fn attr_if(self, name: &'static str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    fn render(&self, depth: usize, out: &mut String) {
        let indent = INDENT.repeat(depth);
        out.push_str(&indent);
        out.push('<');
        out.push_str(self.tag);
        for (name, value) in &self.attributes {
            out.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
        }

        if self.children.is_empty() {
            out.push_str("/>\n");
            return;
        }

        out.push_str(">\n");
        for child in &self.children {
            child.render(depth + 1, out);
        }
        out.push_str(&format!("{}</{}>\n", indent, self.tag));
    }
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn id_element(id: &IdDescriptor) -> Element {
    Element::new("id")
        .attr("name", &id.name)
        .attr("column", &id.column)
        .attr("type", &id.type_name)
        .child(Element::new("generator").attr("class", &id.generator))
}

fn many_to_one_element(association: &AssociationDescriptor) -> Element {
    Element::new("many-to-one")
        .attr("name", &association.name)
        .attr("entity-name", &association.target_entity)
        .attr("column", &association.column)
        .attr_if("cascade", association.active_cascade())
        .attr_if("lazy", association.lazy.then_some("proxy"))
        .attr_if("not-null", association.not_null.then_some("true"))
}

fn property_element(property: &PropertyDescriptor) -> Element {
    Element::new("property")
        .attr("name", &property.name)
        .attr("column", &property.column)
        .attr("type", &property.type_name)
        .attr_if("length", property.length.map(|length| length.to_string()))
}

fn bag_element(collection: &CollectionDescriptor) -> Element {
    let key_column = Element::new("column")
        .attr("name", &collection.key_column)
        .attr_if("not-null", collection.key_not_null.then_some("true"));

    Element::new("bag")
        .attr("name", &collection.name)
        .attr_if("table", collection.table.as_deref())
        .attr("inverse", collection.inverse.to_string())
        .attr("lazy", collection.lazy.to_string())
        .attr_if("fetch", collection.fetch.as_deref())
        .attr_if("cascade", collection.active_cascade())
        .child(Element::new("key").child(key_column))
        .child(Element::new("one-to-many").attr("entity-name", &collection.target_entity))
}

impl MappingDescriptor {
    /// Render as a `hibernate-mapping` document.
    pub fn to_xml(&self) -> String {
        let mut class = Element::new("class")
            .attr("entity-name", &self.entity_name)
            .attr("table", &self.table_name)
            .child(id_element(&self.id));

        class.children.extend(self.associations.iter().map(many_to_one_element));
        class.children.extend(self.properties.iter().map(property_element));
        class.children.extend(self.collections.iter().map(bag_element));

        let mut out = String::new();
        out.push_str(XML_DECLARATION);
        out.push('\n');
        out.push_str(DOCTYPE);
        out.push('\n');
        Element::new("hibernate-mapping")
            .child(class)
            .render(0, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> MappingDescriptor {
        MappingDescriptor {
            entity_name: "Order".into(),
            table_name: "ORDERS".into(),
            id: IdDescriptor {
                name: "id".into(),
                column: "ID".into(),
                type_name: "long".into(),
                generator: "identity".into(),
            },
            properties: vec![PropertyDescriptor {
                name: "name".into(),
                column: "NAME".into(),
                type_name: "string".into(),
                length: Some(40),
                not_null: false,
                precision: None,
                scale: None,
            }],
            associations: vec![AssociationDescriptor {
                name: "customer".into(),
                target_entity: "Customer".into(),
                column: "CUSTOMER_ID".into(),
                cascade: Some("none".into()),
                lazy: false,
                not_null: false,
            }],
            collections: vec![CollectionDescriptor {
                name: "items".into(),
                target_entity: "OrderItem".into(),
                table: None,
                key_column: "ORDER_ID".into(),
                key_not_null: false,
                inverse: false,
                lazy: true,
                fetch: None,
                cascade: Some("all".into()),
            }],
        }
    }

    #[test]
    fn test_full_document() {
        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE hibernate-mapping PUBLIC "-//Hibernate/Hibernate Mapping DTD 3.0//EN" "http://www.hibernate.org/dtd/hibernate-mapping-3.0.dtd">
<hibernate-mapping>
    <class entity-name="Order" table="ORDERS">
        <id name="id" column="ID" type="long">
            <generator class="identity"/>
        </id>
        <many-to-one name="customer" entity-name="Customer" column="CUSTOMER_ID"/>
        <property name="name" column="NAME" type="string" length="40"/>
        <bag name="items" inverse="false" lazy="true" cascade="all">
            <key>
                <column name="ORDER_ID"/>
            </key>
            <one-to-many entity-name="OrderItem"/>
        </bag>
    </class>
</hibernate-mapping>
"#;
        assert_eq!(descriptor().to_xml(), expected);
    }

    #[test]
    fn test_active_many_to_one_attributes() {
        let mut descriptor = descriptor();
        descriptor.associations[0].cascade = Some("save-update".into());
        descriptor.associations[0].lazy = true;
        descriptor.associations[0].not_null = true;

        let xml = descriptor.to_xml();
        assert!(xml.contains(
            r#"<many-to-one name="customer" entity-name="Customer" column="CUSTOMER_ID" cascade="save-update" lazy="proxy" not-null="true"/>"#
        ));
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        assert_eq!(escape_attribute(r#"a<b & "c""#), "a&lt;b &amp; &quot;c&quot;");
    }
}
