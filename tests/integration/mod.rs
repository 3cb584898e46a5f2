// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod fetch_test;
pub mod helpers;
pub mod multipart_test;
pub mod pager_test;
