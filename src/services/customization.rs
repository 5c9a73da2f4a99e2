//! 宠物装扮获取与规范化
//!
//! AMFPHP 的 JSON 接口有个老问题：PHP 的 map 用数组实现，空 map 被序列化成 `[]`。
//! 可能为空的 map 字段先保留为原始 JSON，再逐个按 map 解码，失败则回退为空 map。

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::customization::{lenient_map, CustomPet, Customization};
use crate::infra::amfphp::{Presence, RemoteError, RemoteGateway, RemoteMethod};

/// 名字以数字开头的宠物
///
/// 网关会把这类名字当成整数处理并超时，调用方应在发起请求前拦截
pub fn has_leading_digit(pet_name: &str) -> bool {
    pet_name
        .as_bytes()
        .first()
        .is_some_and(|b| b.is_ascii_digit())
}

/// 网关原始响应，可能为空的 map 字段延迟解码
#[derive(Debug, Deserialize)]
struct CustomizationResponse {
    #[serde(default)]
    custom_pet: CustomPetResponse,
    #[serde(default)]
    closet_items: Value,
    #[serde(default)]
    object_info_registry: Value,
    #[serde(default)]
    object_asset_registry: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CustomPetResponse {
    name: String,
    owner: String,
    slot: i64,
    scale: f64,
    muted: bool,
    body_id: i64,
    species_id: i64,
    color_id: i64,
    biology_by_zone: Value,
    equipped_by_zone: Value,
}

impl CustomizationResponse {
    /// 修复各 map 字段，得到规范化的装扮数据
    fn normalize(self) -> Customization {
        let pet = self.custom_pet;
        Customization {
            custom_pet: CustomPet {
                name: pet.name,
                owner: pet.owner,
                slot: pet.slot,
                scale: pet.scale,
                muted: pet.muted,
                body_id: pet.body_id,
                species_id: pet.species_id,
                color_id: pet.color_id,
                biology_by_zone: lenient_map(pet.biology_by_zone),
                equipped_by_zone: lenient_map(pet.equipped_by_zone),
            },
            closet_items: lenient_map(self.closet_items),
            object_info_registry: lenient_map(self.object_info_registry),
            object_asset_registry: lenient_map(self.object_asset_registry),
        }
    }
}

/// 宠物装扮服务
#[derive(Clone, Debug)]
pub struct CustomizationService {
    get_viewer_data: RemoteMethod,
}

impl CustomizationService {
    pub fn new(gateway: &RemoteGateway) -> Self {
        Self {
            get_viewer_data: gateway
                .service("CustomPetService")
                .method("getViewerData", Presence::NonEmptyBody),
        }
    }

    /// 获取宠物装扮
    ///
    /// `Ok(None)` 表示宠物不存在；只有网络错误和外层解码错误会返回 `Err`，
    /// 各 map 字段的形状问题在内部修复为空 map
    pub async fn get_customization(
        &self,
        pet_name: &str,
    ) -> Result<Option<Customization>, RemoteError> {
        let response: Option<CustomizationResponse> =
            self.get_viewer_data.call(&[pet_name]).await?;

        match response {
            Some(response) => Ok(Some(response.normalize())),
            None => {
                debug!(pet = %pet_name, "Pet not found");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use reqwest::Client;
    use serde_json::json;

    fn service(base: &str) -> CustomizationService {
        CustomizationService::new(&RemoteGateway::new(base, Client::new()))
    }

    fn object_info_json() -> Value {
        json!({
            "obj_info_id": 1,
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
            "species_support": []
        })
    }

    fn mixed_payload() -> Value {
        json!({
            "custom_pet": {
                "name": "Thyassa",
                "owner": "borovan",
                "slot": 1,
                "scale": 0.5,
                "muted": false,
                "body_id": 93,
                "species_id": 54,
                "color_id": 8,
                "biology_by_zone": {
                    "15": {"part_id": 1000, "zone_id": 15, "asset_url": "http://x/1.swf", "zones_restrict": "0000"}
                },
                "equipped_by_zone": []
            },
            "closet_items": [],
            "object_info_registry": {"1": object_info_json()},
            "object_asset_registry": []
        })
    }

    #[test]
    fn test_has_leading_digit() {
        assert!(has_leading_digit("1pet"));
        assert!(has_leading_digit("9"));
        assert!(!has_leading_digit("thyassa"));
        assert!(!has_leading_digit("pet1"));
        assert!(!has_leading_digit(""));
    }

    #[test]
    fn test_normalize_empty_lists_become_empty_maps() {
        let response: CustomizationResponse = serde_json::from_value(mixed_payload()).unwrap();
        let c = response.normalize();

        assert!(c.closet_items.is_empty());
        assert!(c.object_asset_registry.is_empty());
        assert!(c.custom_pet.equipped_by_zone.is_empty());
        assert_eq!(c.object_info_registry.len(), 1);
        assert_eq!(c.object_info_registry["1"].name, "Hat");
        assert_eq!(c.custom_pet.biology_by_zone["15"].part_id, 1000);
        assert_eq!(c.custom_pet.name, "Thyassa");
        assert_eq!(c.custom_pet.species_id, 54);
    }

    #[test]
    fn test_normalize_populated_maps_unchanged() {
        let payload = json!({
            "custom_pet": {
                "name": "Thyassa",
                "equipped_by_zone": {
                    "3": {"asset_id": 900, "zone_id": 3, "closet_obj_id": 7}
                }
            },
            "closet_items": {
                "7": {"closet_obj_id": 7, "obj_info_id": 1, "applied_to": "Thyassa", "is_wishlist": false, "expiration": ""}
            },
            "object_info_registry": {"1": object_info_json()},
            "object_asset_registry": {
                "900": {"asset_id": 900, "zone_id": 3, "asset_url": "http://x/900.swf", "obj_info_id": 1}
            }
        });
        let response: CustomizationResponse = serde_json::from_value(payload).unwrap();
        let c = response.normalize();

        assert_eq!(c.custom_pet.equipped_by_zone["3"].closet_object_id, 7);
        assert_eq!(c.closet_items["7"].object_info_id, 1);
        assert_eq!(c.object_asset_registry["900"].asset_url, "http://x/900.swf");

        // 序列化后的 map 与输入一致
        let out = serde_json::to_value(&c).unwrap();
        assert_eq!(out["object_asset_registry"]["900"]["obj_info_id"], 1);
        assert_eq!(out["closet_items"]["7"]["applied_to"], "Thyassa");
    }

    #[test]
    fn test_normalize_missing_and_null_fields() {
        let payload = json!({
            "custom_pet": {"name": "Thyassa", "biology_by_zone": null},
            "closet_items": null
        });
        let response: CustomizationResponse = serde_json::from_value(payload).unwrap();
        let c = response.normalize();

        assert!(c.closet_items.is_empty());
        assert!(c.object_info_registry.is_empty());
        assert!(c.object_asset_registry.is_empty());
        assert!(c.custom_pet.biology_by_zone.is_empty());
    }

    #[test]
    fn test_normalize_idempotent() {
        let first: CustomizationResponse = serde_json::from_value(mixed_payload()).unwrap();
        let second: CustomizationResponse = serde_json::from_value(mixed_payload()).unwrap();
        assert_eq!(first.normalize(), second.normalize());
    }

    #[tokio::test]
    async fn test_get_customization_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/CustomPetService.getViewerData/thyassa");
            then.status(200).json_body(mixed_payload());
        });

        let c = service(&server.base_url())
            .get_customization("thyassa")
            .await
            .unwrap()
            .unwrap();

        assert!(c.closet_items.is_empty());
        assert_eq!(c.object_info_registry.len(), 1);
        assert!(c.object_asset_registry.is_empty());
        assert!(c.custom_pet.equipped_by_zone.is_empty());
    }

    #[tokio::test]
    async fn test_get_customization_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/CustomPetService.getViewerData/nobody");
            then.status(200).body("");
        });

        let result = service(&server.base_url())
            .get_customization("nobody")
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_get_customization_outer_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/CustomPetService.getViewerData/thyassa");
            then.status(200).body(r#"{"custom_pet": "not an object"}"#);
        });

        let result = service(&server.base_url())
            .get_customization("thyassa")
            .await;

        assert!(matches!(result, Err(RemoteError::Decode { .. })));
    }
}
