//! 宠物装扮领域模型
//!
//! 字段名与上游 `CustomPetService.getViewerData` 的 JSON 保持一致，
//! 对外序列化（公开 API、转发到 Impress）同样使用这些字段名。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 按映射解码，失败时返回空映射
///
/// 上游 PHP 序列化器把空映射输出成 `[]`，与空数组无法区分。
/// `null`、缺失字段、`[]` 以及其他形状不符的值都会得到空映射。
pub fn lenient_map<T: DeserializeOwned>(value: Value) -> BTreeMap<String, T> {
    serde_json::from_value(value).unwrap_or_default()
}

/// `lenient_map` 的 serde 适配，用于嵌套在物品信息里的映射字段
fn deserialize_lenient_map<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_map(value))
}

/// `null` 按字段默认值处理
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 一只宠物的完整装扮数据
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customization {
    pub custom_pet: CustomPet,
    pub closet_items: BTreeMap<String, ClosetItem>,
    pub object_info_registry: BTreeMap<String, ObjectInfo>,
    pub object_asset_registry: BTreeMap<String, ObjectAsset>,
}

/// 宠物本体信息
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomPet {
    pub name: String,
    pub owner: String,
    pub slot: i64,
    pub scale: f64,
    pub muted: bool,
    pub body_id: i64,
    pub species_id: i64,
    pub color_id: i64,
    pub biology_by_zone: BTreeMap<String, Biology>,
    pub equipped_by_zone: BTreeMap<String, Equipped>,
}

/// 宠物身体部件
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Biology {
    pub part_id: i64,
    pub zone_id: i64,
    pub asset_url: String,
    pub zones_restrict: String,
}

/// 已穿戴物品（按 zone）
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Equipped {
    pub asset_id: i64,
    pub zone_id: i64,
    #[serde(rename = "closet_obj_id")]
    pub closet_object_id: i64,
}

/// 衣柜物品
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosetItem {
    #[serde(rename = "closet_obj_id")]
    pub closet_object_id: i64,
    #[serde(rename = "obj_info_id")]
    pub object_info_id: i64,
    pub applied_to: String,
    pub is_wishlist: bool,
    #[serde(deserialize_with = "deserialize_null_default")]
    pub expiration: String,
}

/// 物品信息
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectInfo {
    #[serde(rename = "obj_info_id")]
    pub id: i64,
    #[serde(rename = "assets_by_zone", deserialize_with = "deserialize_lenient_map")]
    pub asset_ids_by_zone: BTreeMap<String, i64>,
    pub zones_restrict: String,
    pub is_compatible: bool,
    pub is_paid: bool,
    pub thumbnail_url: String,
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub rarity: String,
    pub rarity_index: i64,
    pub price: i64,
    pub weight_lbs: i64,
    #[serde(deserialize_with = "deserialize_null_default")]
    pub species_support: Vec<i64>,
}

/// 物品素材
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectAsset {
    pub asset_id: i64,
    pub zone_id: i64,
    pub asset_url: String,
    #[serde(rename = "obj_info_id")]
    pub object_info_id: i64,
}

impl Customization {
    /// 生成重定向用的查询参数
    ///
    /// 顺序：name, color, species, biology[]..., objects[]...
    pub fn redirect_params(&self) -> Vec<(&'static str, String)> {
        let pet = &self.custom_pet;
        let mut params = vec![
            ("name", pet.name.clone()),
            ("color", pet.color_id.to_string()),
            ("species", pet.species_id.to_string()),
        ];
        params.extend(
            pet.biology_by_zone
                .values()
                .map(|b| ("biology[]", b.part_id.to_string())),
        );
        params.extend(
            self.object_info_registry
                .values()
                .map(|o| ("objects[]", o.id.to_string())),
        );
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_upstream_field_names() {
        let mut c = Customization::default();
        c.closet_items.insert(
            "7".to_string(),
            ClosetItem {
                closet_object_id: 7,
                object_info_id: 123,
                applied_to: "pet".to_string(),
                ..Default::default()
            },
        );

        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["closet_items"]["7"]["closet_obj_id"], 7);
        assert_eq!(value["closet_items"]["7"]["obj_info_id"], 123);
        assert!(value["object_asset_registry"].as_object().unwrap().is_empty());
        assert!(value["custom_pet"]["equipped_by_zone"].is_object());
    }

    #[test]
    fn test_object_info_type_field() {
        let info: ObjectInfo = serde_json::from_value(serde_json::json!({
            "obj_info_id": 42,
            "assets_by_zone": {"3": 900},
            "zones_restrict": "",
            "is_compatible": true,
            "is_paid": false,
            "thumbnail_url": "http://images.neopets.com/items/hat.gif",
            "name": "Hat",
            "description": "A hat",
            "category": "Clothes",
            "type": "Clothes",
            "rarity": "Common",
            "rarity_index": 1,
            "price": 100,
            "weight_lbs": 1,
            "species_support": [1, 2]
        }))
        .unwrap();

        assert_eq!(info.id, 42);
        assert_eq!(info.kind, "Clothes");
        assert_eq!(info.asset_ids_by_zone.get("3"), Some(&900));
        assert_eq!(info.species_support, vec![1, 2]);
    }

    #[test]
    fn test_null_fields_default() {
        let item: ClosetItem =
            serde_json::from_value(serde_json::json!({"closet_obj_id": 3, "expiration": null}))
                .unwrap();
        assert_eq!(item.expiration, "");

        let info: ObjectInfo =
            serde_json::from_value(serde_json::json!({"species_support": null})).unwrap();
        assert!(info.species_support.is_empty());
    }

    #[test]
    fn test_lenient_map() {
        let empty: BTreeMap<String, i64> = lenient_map(serde_json::json!([]));
        assert!(empty.is_empty());

        let missing: BTreeMap<String, i64> = lenient_map(Value::Null);
        assert!(missing.is_empty());

        let filled: BTreeMap<String, i64> = lenient_map(serde_json::json!({"1": 5, "2": 6}));
        assert_eq!(filled.len(), 2);
        assert_eq!(filled["2"], 6);
    }

    #[test]
    fn test_nested_assets_by_zone_empty_list() {
        let info: ObjectInfo =
            serde_json::from_value(serde_json::json!({"obj_info_id": 1, "assets_by_zone": []}))
                .unwrap();
        assert!(info.asset_ids_by_zone.is_empty());
        assert_eq!(info.id, 1);
    }

    #[test]
    fn test_redirect_params() {
        let mut c = Customization::default();
        c.custom_pet.name = "Thyassa".to_string();
        c.custom_pet.color_id = 8;
        c.custom_pet.species_id = 54;
        c.custom_pet.biology_by_zone.insert(
            "15".to_string(),
            Biology {
                part_id: 1000,
                ..Default::default()
            },
        );
        c.object_info_registry.insert(
            "42".to_string(),
            ObjectInfo {
                id: 42,
                ..Default::default()
            },
        );

        let params = c.redirect_params();
        assert_eq!(params[0], ("name", "Thyassa".to_string()));
        assert_eq!(params[1], ("color", "8".to_string()));
        assert_eq!(params[2], ("species", "54".to_string()));
        assert_eq!(params[3], ("biology[]", "1000".to_string()));
        assert_eq!(params[4], ("objects[]", "42".to_string()));
    }
}
